use std::rc::Rc;

use serde_json::Value;

/// An array element index or object member name in a node's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

/// The location of a node's value below the root, in selection order.
pub type Location = Vec<PathElement>;

/// Whether node locations are recorded during evaluation.
///
/// `Discard` is the values-only policy: locations stay empty and every
/// normalized path renders as `$`. `Build` records every descent step so
/// normalized paths and in-place replacement work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Discard,
    Build,
}

impl PathMode {
    /// Extends a parent location by one element, or keeps it empty under
    /// `Discard`.
    pub fn extend(&self, parent: &Location, element: PathElement) -> Location {
        match self {
            PathMode::Discard => Vec::new(),
            PathMode::Build => {
                let mut location = parent.clone();
                location.push(element);
                location
            }
        }
    }
}

/// A non-owning handle to a node's value.
///
/// `Ref` borrows from the root document. `Synth` holds a value the
/// evaluator made up on the fly (an array's `length`, a single code
/// point of a string, an aggregate-function result); reference counting
/// keeps the handle stable for as long as any node points at it.
#[derive(Debug, Clone)]
pub enum NodeVal<'v> {
    Ref(&'v Value),
    Synth(Rc<Value>),
}

impl<'v> NodeVal<'v> {
    pub fn get(&self) -> &Value {
        match self {
            NodeVal::Ref(value) => value,
            NodeVal::Synth(value) => value,
        }
    }

    /// The `index`-th element, if this is an array holding one.
    ///
    /// A child of a synthesized value is itself synthesized; nothing in
    /// the root document backs it.
    pub fn child_index(&self, index: usize) -> Option<NodeVal<'v>> {
        match self {
            NodeVal::Ref(value) => value.get(index).map(NodeVal::Ref),
            NodeVal::Synth(value) => value
                .get(index)
                .map(|child| NodeVal::Synth(Rc::new(child.clone()))),
        }
    }

    /// The member named `key`, if this is an object holding one.
    pub fn child_key(&self, key: &str) -> Option<NodeVal<'v>> {
        match self {
            NodeVal::Ref(value) => value.get(key).map(NodeVal::Ref),
            NodeVal::Synth(value) => value
                .get(key)
                .map(|child| NodeVal::Synth(Rc::new(child.clone()))),
        }
    }
}

/// One entry of a node set: a location plus a value handle.
///
/// `skip_contained_object` is transient state used only while a filter
/// selector runs under recursive descent; a filter that matched an
/// array's elements sets it so the same filter does not re-match the
/// containing object one level up.
#[derive(Debug, Clone)]
pub struct Node<'v> {
    pub skip_contained_object: bool,
    pub location: Location,
    pub val: NodeVal<'v>,
}

/// An ordered sequence of nodes; order is document order of selection.
pub type NodeSet<'v> = Vec<Node<'v>>;

impl<'v> Node<'v> {
    pub fn new(location: Location, val: NodeVal<'v>) -> Self {
        Node {
            skip_contained_object: false,
            location,
            val,
        }
    }

    pub fn root(value: &'v Value) -> Self {
        Node::new(Vec::new(), NodeVal::Ref(value))
    }

    pub fn synthesized(location: Location, value: Value) -> Self {
        Node::new(location, NodeVal::Synth(Rc::new(value)))
    }

    pub fn value(&self) -> &Value {
        self.val.get()
    }

    /// The node's location as a normalized path, e.g. `$['a'][3]`.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for element in &self.location {
            match element {
                PathElement::Index(i) => path.push_str(&format!("[{}]", i)),
                PathElement::Name(name) => path.push_str(&format!("['{}']", name)),
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_path_mixed() {
        let value = json!(true);
        let node = Node::new(
            vec![
                PathElement::Name(String::from("a")),
                PathElement::Index(2),
                PathElement::Name(String::from("c")),
            ],
            NodeVal::Ref(&value),
        );
        assert_eq!(node.path(), "$['a'][2]['c']");
    }

    #[test]
    fn normalized_path_root() {
        let value = json!(null);
        assert_eq!(Node::root(&value).path(), "$");
    }

    #[test]
    fn discard_mode_keeps_locations_empty() {
        let parent = vec![PathElement::Name(String::from("a"))];
        let location = PathMode::Discard.extend(&parent, PathElement::Index(0));
        assert!(location.is_empty());
    }

    #[test]
    fn build_mode_extends() {
        let parent = vec![PathElement::Name(String::from("a"))];
        let location = PathMode::Build.extend(&parent, PathElement::Index(0));
        assert_eq!(
            location,
            vec![PathElement::Name(String::from("a")), PathElement::Index(0)]
        );
    }

    #[test]
    fn synthesized_children_are_synthesized() {
        let val = NodeVal::Synth(Rc::new(json!([1, 2])));
        let child = val.child_index(1).unwrap();
        assert!(matches!(child, NodeVal::Synth(_)));
        assert_eq!(child.get(), &json!(2));
    }
}
