use std::mem;

use serde_json::Value;

use crate::errors::{JsonPathError, JsonPathErrorKind};
use crate::jsonpath::filter::{parse_filter, FilterExpr};
use crate::jsonpath::functions;
use crate::jsonpath::index::try_string_to_index;
use crate::jsonpath::node::{Location, Node, NodeSet, NodeVal, PathElement, PathMode};
use crate::jsonpath::selectors::{select_name, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathState {
    Start,
    Cr,
    Lf,
    ExpectDotOrLeftBracket,
    ExpectUnquotedNameOrLeftBracket,
    UnquotedName,
    LeftBracket,
    LeftBracketStart,
    LeftBracketEnd,
    LeftBracketEnd2,
    LeftBracketStep,
    LeftBracketStep2,
    LeftBracketSingleQuotedString,
    LeftBracketDoubleQuotedString,
    ExpectCommaOrRightBracket,
    FunctionName,
    FunctionArgument,
    Dot,
}

/// The character-driven JSONPath machine.
///
/// Characters drive state transitions; selectors accumulate per
/// bracketed group and are applied against the top node set when the
/// group closes. The node-set stack grows one layer per applied group;
/// the top layer is what `get_values`, `get_normalized_paths`, and
/// `get_locations` read.
pub struct Evaluator<'v> {
    mode: PathMode,
    state: PathState,
    buffer: String,
    start: usize,
    positive_start: bool,
    end: usize,
    positive_end: bool,
    undefined_end: bool,
    step: usize,
    positive_step: bool,
    recursive_descent: bool,
    nodes: NodeSet<'v>,
    stack: Vec<NodeSet<'v>>,
    line: usize,
    column: usize,
    chars: Vec<char>,
    pos: usize,
    selectors: Vec<Selector>,
}

impl<'v> Evaluator<'v> {
    pub fn new(mode: PathMode) -> Self {
        Evaluator {
            mode,
            state: PathState::Start,
            buffer: String::new(),
            start: 0,
            positive_start: true,
            end: 0,
            positive_end: true,
            undefined_end: true,
            step: 1,
            positive_step: true,
            recursive_descent: false,
            nodes: Vec::new(),
            stack: Vec::new(),
            line: 1,
            column: 1,
            chars: Vec::new(),
            pos: 0,
            selectors: Vec::new(),
        }
    }

    /// Drives the state machine over `path` against `root`. On success
    /// the node-set stack is populated and the accessors below read the
    /// top set.
    pub fn evaluate(&mut self, root: &'v Value, path: &str) -> Result<(), JsonPathError> {
        self.chars = path.chars().collect();
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.state = PathState::Start;
        self.recursive_descent = false;
        self.nodes.clear();
        self.stack.clear();
        self.selectors.clear();
        self.clear_index();

        let mut function_name = String::new();
        let mut pre_line_break_state = PathState::Start;

        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            match self.state {
                PathState::Cr => {
                    self.line += 1;
                    self.column = 1;
                    self.state = pre_line_break_state;
                    if ch == '\n' {
                        self.advance();
                    }
                }
                PathState::Lf => {
                    self.line += 1;
                    self.column = 1;
                    self.state = pre_line_break_state;
                }
                PathState::Start => match ch {
                    ' ' | '\t' => self.advance(),
                    '$' => {
                        self.stack.push(vec![Node::root(root)]);
                        self.state = PathState::ExpectDotOrLeftBracket;
                        self.advance();
                    }
                    '.' | '[' => {
                        return Err(self.error(
                            JsonPathErrorKind::ExpectedRoot,
                            format!("expected '$', found '{}'", ch),
                        ));
                    }
                    _ => {
                        // might be a function call; the name is validated
                        // against the table at '('
                        function_name.push(ch);
                        self.state = PathState::FunctionName;
                        self.advance();
                    }
                },
                PathState::FunctionName => match ch {
                    '(' => {
                        self.state = PathState::FunctionArgument;
                        self.advance();
                    }
                    _ => {
                        function_name.push(ch);
                        self.advance();
                    }
                },
                PathState::FunctionArgument => match ch {
                    ')' => {
                        self.call_function(root, &function_name)?;
                        self.state = PathState::ExpectDotOrLeftBracket;
                        self.advance();
                    }
                    _ => {
                        self.buffer.push(ch);
                        self.advance();
                    }
                },
                PathState::Dot => match ch {
                    '.' => {
                        self.recursive_descent = true;
                        self.advance();
                        self.state = PathState::ExpectUnquotedNameOrLeftBracket;
                    }
                    _ => {
                        self.state = PathState::ExpectUnquotedNameOrLeftBracket;
                    }
                },
                PathState::ExpectUnquotedNameOrLeftBracket => match ch {
                    '.' => {
                        return Err(self.error(
                            JsonPathErrorKind::ExpectedName,
                            String::from("expected a name, found '.'"),
                        ));
                    }
                    '*' => {
                        self.end_all();
                        self.transfer_nodes();
                        self.state = PathState::ExpectDotOrLeftBracket;
                        self.advance();
                    }
                    '[' => {
                        self.state = PathState::LeftBracket;
                        self.advance();
                    }
                    _ => {
                        self.buffer.clear();
                        self.state = PathState::UnquotedName;
                    }
                },
                PathState::ExpectDotOrLeftBracket => match ch {
                    ' ' | '\t' => self.advance(),
                    '.' => {
                        self.state = PathState::Dot;
                        self.advance();
                    }
                    '[' => {
                        self.state = PathState::LeftBracket;
                        self.advance();
                    }
                    _ => {
                        return Err(self.error(
                            JsonPathErrorKind::ExpectedSeparator,
                            format!("expected '.' or '[', found '{}'", ch),
                        ));
                    }
                },
                PathState::ExpectCommaOrRightBracket => match ch {
                    ',' => {
                        self.state = PathState::LeftBracket;
                        self.advance();
                    }
                    ']' => {
                        self.apply_selectors(root);
                        self.state = PathState::ExpectDotOrLeftBracket;
                        self.advance();
                    }
                    ' ' | '\t' => self.advance(),
                    _ => {
                        return Err(self.error(
                            JsonPathErrorKind::ExpectedRightBracket,
                            format!("expected ',' or ']', found '{}'", ch),
                        ));
                    }
                },
                PathState::LeftBracket => match ch {
                    ' ' | '\t' => self.advance(),
                    '(' => {
                        let expr = self.hand_off_to_filter()?;
                        self.selectors.push(Selector::Expr { expr });
                        self.state = PathState::ExpectCommaOrRightBracket;
                    }
                    '?' => {
                        let expr = self.hand_off_to_filter()?;
                        self.selectors.push(Selector::Filter { expr });
                        self.state = PathState::ExpectCommaOrRightBracket;
                    }
                    ':' => {
                        self.clear_index();
                        self.state = PathState::LeftBracketEnd;
                        self.advance();
                    }
                    '*' => {
                        self.end_all();
                        self.state = PathState::ExpectCommaOrRightBracket;
                        self.advance();
                    }
                    '\'' => {
                        self.state = PathState::LeftBracketSingleQuotedString;
                        self.advance();
                    }
                    '"' => {
                        self.state = PathState::LeftBracketDoubleQuotedString;
                        self.advance();
                    }
                    _ => {
                        self.clear_index();
                        self.buffer.push(ch);
                        self.state = PathState::LeftBracketStart;
                        self.advance();
                    }
                },
                PathState::LeftBracketStart => {
                    match ch {
                        ':' => {
                            match try_string_to_index(&self.buffer) {
                                Some((start, positive)) => {
                                    self.start = start;
                                    self.positive_start = positive;
                                }
                                None => {
                                    return Err(self.error(
                                        JsonPathErrorKind::ExpectedIndex,
                                        format!("'{}' is not a slice bound", self.buffer),
                                    ));
                                }
                            }
                            self.state = PathState::LeftBracketEnd;
                        }
                        ',' => {
                            self.retain_name_selector();
                            self.state = PathState::LeftBracket;
                        }
                        ']' => {
                            self.retain_name_selector();
                            self.apply_selectors(root);
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        _ => self.buffer.push(ch),
                    }
                    self.advance();
                }
                PathState::LeftBracketEnd => {
                    match ch {
                        '-' => {
                            self.positive_end = false;
                            self.state = PathState::LeftBracketEnd2;
                        }
                        ':' => {
                            self.step = 0;
                            self.state = PathState::LeftBracketStep;
                        }
                        '0'..='9' => {
                            self.undefined_end = false;
                            self.end = ch as usize - '0' as usize;
                            self.state = PathState::LeftBracketEnd2;
                        }
                        ',' => {
                            self.retain_slice_selector();
                            self.state = PathState::LeftBracket;
                        }
                        ']' => {
                            self.retain_slice_selector();
                            self.apply_selectors(root);
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        _ => {}
                    }
                    self.advance();
                }
                PathState::LeftBracketEnd2 => {
                    match ch {
                        ':' => {
                            self.step = 0;
                            self.state = PathState::LeftBracketStep;
                        }
                        '0'..='9' => {
                            self.undefined_end = false;
                            self.end = self
                                .end
                                .wrapping_mul(10)
                                .wrapping_add(ch as usize - '0' as usize);
                        }
                        ',' => {
                            self.retain_slice_selector();
                            self.state = PathState::LeftBracket;
                        }
                        ']' => {
                            self.retain_slice_selector();
                            self.apply_selectors(root);
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        _ => {}
                    }
                    self.advance();
                }
                PathState::LeftBracketStep => {
                    match ch {
                        '-' => {
                            self.positive_step = false;
                            self.state = PathState::LeftBracketStep2;
                        }
                        '0'..='9' => {
                            self.step = ch as usize - '0' as usize;
                            self.state = PathState::LeftBracketStep2;
                        }
                        ',' => {
                            self.retain_slice_selector();
                            self.state = PathState::LeftBracket;
                        }
                        ']' => {
                            self.retain_slice_selector();
                            self.apply_selectors(root);
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        _ => {}
                    }
                    self.advance();
                }
                PathState::LeftBracketStep2 => {
                    match ch {
                        '0'..='9' => {
                            self.step = self
                                .step
                                .wrapping_mul(10)
                                .wrapping_add(ch as usize - '0' as usize);
                        }
                        ',' => {
                            self.retain_slice_selector();
                            self.state = PathState::LeftBracket;
                        }
                        ']' => {
                            self.retain_slice_selector();
                            self.apply_selectors(root);
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        _ => {}
                    }
                    self.advance();
                }
                PathState::UnquotedName => {
                    match ch {
                        '[' => {
                            self.apply_unquoted_string();
                            self.transfer_nodes();
                            self.start = 0;
                            self.state = PathState::LeftBracket;
                        }
                        '.' => {
                            self.apply_unquoted_string();
                            self.transfer_nodes();
                            self.state = PathState::Dot;
                        }
                        ' ' | '\t' => {
                            self.apply_unquoted_string();
                            self.transfer_nodes();
                            self.state = PathState::ExpectDotOrLeftBracket;
                        }
                        '\r' => {
                            self.apply_unquoted_string();
                            self.transfer_nodes();
                            pre_line_break_state = PathState::ExpectDotOrLeftBracket;
                            self.state = PathState::Cr;
                        }
                        '\n' => {
                            self.apply_unquoted_string();
                            self.transfer_nodes();
                            pre_line_break_state = PathState::ExpectDotOrLeftBracket;
                            self.state = PathState::Lf;
                        }
                        _ => self.buffer.push(ch),
                    }
                    self.advance();
                }
                PathState::LeftBracketSingleQuotedString => {
                    match ch {
                        '\'' => {
                            self.retain_name_selector();
                            self.state = PathState::ExpectCommaOrRightBracket;
                        }
                        '\\' => {
                            // the escape is kept verbatim, no unescaping
                            self.buffer.push(ch);
                            if self.pos + 1 < self.chars.len() {
                                self.advance();
                                self.buffer.push(self.chars[self.pos]);
                            }
                        }
                        _ => self.buffer.push(ch),
                    }
                    self.advance();
                }
                PathState::LeftBracketDoubleQuotedString => {
                    match ch {
                        '"' => {
                            self.retain_name_selector();
                            self.state = PathState::ExpectCommaOrRightBracket;
                        }
                        '\\' => {
                            self.buffer.push(ch);
                            if self.pos + 1 < self.chars.len() {
                                self.advance();
                                self.buffer.push(self.chars[self.pos]);
                            }
                        }
                        _ => self.buffer.push(ch),
                    }
                    self.advance();
                }
            }
        }

        if self.state == PathState::UnquotedName {
            self.apply_unquoted_string();
            self.transfer_nodes();
        }

        Ok(())
    }

    /// The values selected by the last `evaluate`, in document order.
    pub fn get_values(&self) -> Vec<Value> {
        match self.stack.last() {
            Some(top) => top.iter().map(|node| node.value().clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Normalized paths of the selected nodes, e.g. `$['a'][3]`.
    pub fn get_normalized_paths(&self) -> Vec<String> {
        match self.stack.last() {
            Some(top) => top.iter().map(Node::path).collect(),
            None => Vec::new(),
        }
    }

    /// Raw handles to the selected values, used for function arguments.
    pub fn get_pointers(&self) -> Vec<&Value> {
        match self.stack.last() {
            Some(top) => top.iter().map(Node::value).collect(),
            None => Vec::new(),
        }
    }

    /// Locations of the selected nodes, for mutation through the root.
    pub fn get_locations(&self) -> Vec<Location> {
        match self.stack.last() {
            Some(top) => top.iter().map(|node| node.location.clone()).collect(),
            None => Vec::new(),
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.column += 1;
    }

    fn error(&self, kind: JsonPathErrorKind, msg: String) -> JsonPathError {
        JsonPathError::new(kind, msg, self.line, self.column)
    }

    fn clear_index(&mut self) {
        self.buffer.clear();
        self.start = 0;
        self.positive_start = true;
        self.end = 0;
        self.positive_end = true;
        self.undefined_end = true;
        self.step = 1;
        self.positive_step = true;
    }

    fn retain_name_selector(&mut self) {
        self.selectors.push(Selector::Name {
            name: mem::take(&mut self.buffer),
            positive_start: self.positive_start,
        });
    }

    fn retain_slice_selector(&mut self) {
        self.selectors.push(Selector::Slice {
            start: self.start,
            positive_start: self.positive_start,
            end: self.end,
            positive_end: self.positive_end,
            undefined_end: self.undefined_end,
            step: self.step,
            positive_step: self.positive_step,
        });
    }

    /// Hands the cursor to the filter parser at `(` or `?`, advancing
    /// past the consumed expression.
    fn hand_off_to_filter(&mut self) -> Result<FilterExpr, JsonPathError> {
        let rest: String = self.chars[self.pos..].iter().collect();
        let parsed = parse_filter(&rest, self.line, self.column)?;
        self.pos += parsed.consumed;
        self.line = parsed.line;
        self.column = parsed.column;
        Ok(parsed.expr)
    }

    /// Runs the function-argument path through a nested evaluator, looks
    /// the function up, and seeds the stack with its result.
    fn call_function(&mut self, root: &'v Value, function_name: &str) -> Result<(), JsonPathError> {
        let mut inner = Evaluator::new(self.mode);
        inner.evaluate(root, &self.buffer)?;

        let function = functions::lookup(function_name).ok_or_else(|| {
            self.error(
                JsonPathErrorKind::UnsupportedFunction,
                format!("unknown function '{}'", function_name),
            )
        })?;
        let result = function(&inner.get_pointers());

        self.buffer.clear();
        self.stack.push(vec![Node::synthesized(Vec::new(), result)]);
        Ok(())
    }

    /// `*`: every element and member of every node in the top set
    /// becomes part of the accumulator. One level only; the descent flag
    /// does not change what this emits.
    fn end_all(&mut self) {
        if let Some(top) = self.stack.pop() {
            for node in &top {
                match node.val.get() {
                    Value::Array(array) => {
                        for i in 0..array.len() {
                            if let Some(child) = node.val.child_index(i) {
                                self.nodes.push(Node::new(
                                    self.mode.extend(&node.location, PathElement::Index(i)),
                                    child,
                                ));
                            }
                        }
                    }
                    Value::Object(map) => {
                        for key in map.keys() {
                            if let Some(child) = node.val.child_key(key) {
                                self.nodes.push(Node::new(
                                    self.mode
                                        .extend(&node.location, PathElement::Name(key.clone())),
                                    child,
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }
            self.stack.push(top);
        }
        self.start = 0;
    }

    /// Flushes the unquoted-name buffer against the top set, with the
    /// recursive-descent pass when the flag is up.
    fn apply_unquoted_string(&mut self) {
        if !self.buffer.is_empty() {
            let name = mem::take(&mut self.buffer);
            if let Some(top) = self.stack.pop() {
                for node in &top {
                    apply_name(
                        &name,
                        self.recursive_descent,
                        self.mode,
                        &node.location,
                        &node.val,
                        &mut self.nodes,
                    );
                }
                self.stack.push(top);
            }
        }
        self.buffer.clear();
    }

    /// Applies the accumulated selector group to every node of the top
    /// set, then promotes the accumulator to the new top.
    fn apply_selectors(&mut self, root: &'v Value) {
        if !self.selectors.is_empty() {
            if let Some(mut top) = self.stack.pop() {
                for node in top.iter_mut() {
                    let location = node.location.clone();
                    let val = node.val.clone();
                    apply_node(
                        &self.selectors,
                        self.recursive_descent,
                        self.mode,
                        node,
                        &location,
                        &val,
                        root,
                        &mut self.nodes,
                    );
                }
                self.stack.push(top);
            }
            self.selectors.clear();
        }
        self.transfer_nodes();
    }

    fn transfer_nodes(&mut self) {
        let nodes = mem::take(&mut self.nodes);
        self.stack.push(nodes);
        self.recursive_descent = false;
    }
}

/// One name-selection pass at `(location, val)`, recursing into
/// composite children when the descent flag is set. The location grows
/// at every step so normalized paths stay addressable.
fn apply_name<'v>(
    name: &str,
    recursive: bool,
    mode: PathMode,
    location: &Location,
    val: &NodeVal<'v>,
    accum: &mut NodeSet<'v>,
) {
    select_name(name, location, val, mode, accum);

    if recursive {
        match val.get() {
            Value::Object(map) => {
                for key in map.keys() {
                    let child = val.child_key(key).expect("member key exists");
                    if child.get().is_object() || child.get().is_array() {
                        let child_location = mode.extend(location, PathElement::Name(key.clone()));
                        apply_name(name, recursive, mode, &child_location, &child, accum);
                    }
                }
            }
            Value::Array(array) => {
                for i in 0..array.len() {
                    let child = val.child_index(i).expect("element index in range");
                    if child.get().is_object() || child.get().is_array() {
                        let child_location = mode.extend(location, PathElement::Index(i));
                        apply_name(name, recursive, mode, &child_location, &child, accum);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Applies every retained selector at `(location, val)`, recursing into
/// composite children when the descent flag is set. `node` rides along
/// for the filter selector's `skip_contained_object` flag.
#[allow(clippy::too_many_arguments)]
fn apply_node<'v>(
    selectors: &[Selector],
    recursive: bool,
    mode: PathMode,
    node: &mut Node<'v>,
    location: &Location,
    val: &NodeVal<'v>,
    root: &'v Value,
    accum: &mut NodeSet<'v>,
) {
    for selector in selectors {
        selector.select(node, location, val, root, mode, accum);
    }

    if recursive {
        match val.get() {
            Value::Object(map) => {
                for key in map.keys() {
                    let child = val.child_key(key).expect("member key exists");
                    if child.get().is_object() || child.get().is_array() {
                        let child_location = mode.extend(location, PathElement::Name(key.clone()));
                        apply_node(
                            selectors,
                            recursive,
                            mode,
                            node,
                            &child_location,
                            &child,
                            root,
                            accum,
                        );
                    }
                }
            }
            Value::Array(array) => {
                for i in 0..array.len() {
                    let child = val.child_index(i).expect("element index in range");
                    if child.get().is_object() || child.get().is_array() {
                        let child_location = mode.extend(location, PathElement::Index(i));
                        apply_node(
                            selectors,
                            recursive,
                            mode,
                            node,
                            &child_location,
                            &child,
                            root,
                            accum,
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(root: &Value, path: &str) -> Vec<Value> {
        let mut evaluator = Evaluator::new(PathMode::Discard);
        evaluator.evaluate(root, path).expect("path should evaluate");
        evaluator.get_values()
    }

    fn paths(root: &Value, path: &str) -> Vec<String> {
        let mut evaluator = Evaluator::new(PathMode::Build);
        evaluator.evaluate(root, path).expect("path should evaluate");
        evaluator.get_normalized_paths()
    }

    fn error(root: &Value, path: &str) -> JsonPathError {
        let mut evaluator = Evaluator::new(PathMode::Discard);
        evaluator
            .evaluate(root, path)
            .expect_err("path should fail")
    }

    #[test]
    fn root_only() {
        let root = json!({"a": 1});
        assert_eq!(values(&root, "$"), vec![root.clone()]);
        assert_eq!(paths(&root, "$"), vec!["$"]);
    }

    #[test]
    fn dot_names() {
        let root = json!({"a": {"b": {"c": 42}}});
        assert_eq!(values(&root, "$.a.b.c"), vec![json!(42)]);
        assert_eq!(paths(&root, "$.a.b.c"), vec!["$['a']['b']['c']"]);
    }

    #[test]
    fn bracketed_names() {
        let root = json!({"a": {"b c": 1}});
        assert_eq!(values(&root, "$['a']['b c']"), vec![json!(1)]);
        assert_eq!(values(&root, "$[\"a\"][\"b c\"]"), vec![json!(1)]);
    }

    #[test]
    fn bracketed_index_and_negative_index() {
        let root = json!({"a": [1, 2, 3, 4]});
        assert_eq!(values(&root, "$.a[1]"), vec![json!(2)]);
        assert_eq!(values(&root, "$.a[-1]"), vec![json!(4)]);
        assert_eq!(paths(&root, "$.a[-1]"), vec!["$['a'][3]"]);
    }

    #[test]
    fn union_of_selectors() {
        let root = json!({"a": [10, 20, 30]});
        assert_eq!(
            values(&root, "$.a[0, 2]"),
            vec![json!(10), json!(30)]
        );
        assert_eq!(
            values(&root, "$.a['0', 2]"),
            vec![json!(10), json!(30)]
        );
    }

    #[test]
    fn wildcard_shorthand_and_bracketed() {
        let root = json!({"a": {"x": 1, "y": 2}});
        assert_eq!(values(&root, "$.a.*"), vec![json!(1), json!(2)]);
        assert_eq!(values(&root, "$.a[*]"), vec![json!(1), json!(2)]);
    }

    #[test]
    fn recursive_descent_collects_in_document_order() {
        let root = json!({"store": {"book": [{"price": 5}, {"price": 10}, {"price": 20}]}});
        assert_eq!(
            values(&root, "$..price"),
            vec![json!(5), json!(10), json!(20)]
        );
    }

    #[test]
    fn recursive_descent_paths_are_addressable() {
        let root = json!({"store": {"book": [{"price": 5}, {"price": 10}]}});
        assert_eq!(
            paths(&root, "$..price"),
            vec![
                "$['store']['book'][0]['price']",
                "$['store']['book'][1]['price']"
            ]
        );
    }

    #[test]
    fn recursive_descent_bracketed_selector() {
        let root = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(values(&root, "$..['c']"), vec![json!(1), json!(2)]);
    }

    #[test]
    fn array_length_and_string_length() {
        let root = json!({"a": [1, 2, 3, 4], "s": "hello"});
        assert_eq!(values(&root, "$.a.length"), vec![json!(4)]);
        assert_eq!(values(&root, "$.s.length"), vec![json!(5)]);
        assert_eq!(values(&root, "$.s[1]"), vec![json!("e")]);
    }

    #[test]
    fn function_call_seeds_the_stack() {
        let root = json!({"xs": [1, 2, 3, 4, 5]});
        assert_eq!(values(&root, "max($.xs[*])"), vec![json!(5.0)]);
        assert_eq!(values(&root, "min($.xs[*])"), vec![json!(1.0)]);
        assert_eq!(values(&root, "avg($.xs[*])"), vec![json!(3.0)]);
        assert_eq!(values(&root, "sum($.xs[*])"), vec![json!(15.0)]);
        assert_eq!(values(&root, "count($.xs[*])"), vec![json!(5)]);
        assert_eq!(values(&root, "prod($.xs[*])"), vec![json!(120.0)]);
    }

    #[test]
    fn count_of_recursive_wildcard_is_finite() {
        let root = json!({"xs": [1, 2, 3]});
        let result = values(&root, "count($..*)");
        assert_eq!(result.len(), 1);
        assert!(result[0].as_u64().is_some());
    }

    #[test]
    fn unknown_function_is_an_error() {
        let root = json!({"xs": [1]});
        let err = error(&root, "median($.xs[*])");
        assert_eq!(err.kind, JsonPathErrorKind::UnsupportedFunction);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = json!({});
        let err = error(&root, ".a");
        assert_eq!(err.kind, JsonPathErrorKind::ExpectedRoot);
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn double_dot_then_dot_is_an_error() {
        let root = json!({});
        let err = error(&root, "$...a");
        assert_eq!(err.kind, JsonPathErrorKind::ExpectedName);
    }

    #[test]
    fn missing_separator_is_an_error() {
        let root = json!({});
        let err = error(&root, "$a");
        assert_eq!(err.kind, JsonPathErrorKind::ExpectedSeparator);
        assert_eq!((err.line, err.column), (1, 2));
    }

    #[test]
    fn bad_bracket_content_is_an_error() {
        let root = json!({"a": [1]});
        let err = error(&root, "$.a['x' ?]");
        assert_eq!(err.kind, JsonPathErrorKind::ExpectedRightBracket);
    }

    #[test]
    fn bad_slice_bound_is_an_error() {
        let root = json!({"a": [1]});
        let err = error(&root, "$.a[x:2]");
        assert_eq!(err.kind, JsonPathErrorKind::ExpectedIndex);
    }

    #[test]
    fn line_breaks_bump_the_line_counter() {
        let root = json!({"a": {"b": 1}});
        assert_eq!(values(&root, "$.a\n.b"), vec![json!(1)]);

        let err = error(&root, "$.a\n!");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn quoted_name_with_escape_kept_verbatim() {
        // the escape sequence is not unescaped, so the stored name
        // contains the backslash
        let root = json!({"a\\'b": 1});
        assert_eq!(values(&root, "$['a\\'b']"), vec![json!(1)]);
    }

    #[test]
    fn filter_selector_end_to_end() {
        let root = json!({"book": [
            {"title": "one", "price": 5},
            {"title": "two", "price": 15}
        ]});
        assert_eq!(
            values(&root, "$.book[?(@.price < 10)]"),
            vec![json!({"title": "one", "price": 5})]
        );
        assert_eq!(
            paths(&root, "$.book[?(@.price < 10)]"),
            vec!["$['book'][0]"]
        );
    }

    #[test]
    fn filter_under_recursive_descent_does_not_rematch_contained_object() {
        // the filter matches the array's element, and the descent pass
        // clears the flag on the contained object instead of emitting it
        // a second time
        let root = json!({"book": [{"price": 5}]});
        assert_eq!(
            values(&root, "$..[?(@.price < 10)]"),
            vec![json!({"price": 5})]
        );
    }

    #[test]
    fn expression_selector_end_to_end() {
        let root = json!({"a": [10, 20, 30]});
        assert_eq!(values(&root, "$.a[(@.length - 1)]"), vec![json!(30)]);
    }

    #[test]
    fn values_and_paths_have_equal_length() {
        let root = json!({"store": {"book": [{"price": 5}, {"price": 10}]}});
        for path in ["$.store.book[*].price", "$..price", "$.store.book[0:2]"] {
            let mut evaluator = Evaluator::new(PathMode::Build);
            evaluator.evaluate(&root, path).unwrap();
            assert_eq!(
                evaluator.get_values().len(),
                evaluator.get_normalized_paths().len()
            );
        }
    }
}
