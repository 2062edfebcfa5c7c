use std::fmt;

use serde_json::{json, Value};

use crate::jsonpath::filter::FilterExpr;
use crate::jsonpath::index::try_string_to_index;
use crate::jsonpath::node::{Location, Node, NodeSet, NodeVal, PathElement, PathMode};

/// One selector inside a bracketed selection.
#[derive(Debug, Clone)]
pub enum Selector {
    /// A member name, or an index literal when applied to an array.
    Name { name: String, positive_start: bool },
    /// `[start:end:step]` over an array; field signs carried separately,
    /// magnitudes unsigned.
    Slice {
        start: usize,
        positive_start: bool,
        end: usize,
        positive_end: bool,
        undefined_end: bool,
        step: usize,
        positive_step: bool,
    },
    /// `[(expr)]` — the expression result is used as an index or key.
    Expr { expr: FilterExpr },
    /// `[?(predicate)]` — keeps the elements the predicate holds for.
    Filter { expr: FilterExpr },
}

impl Selector {
    /// Applies this selector at `val`, pushing matches into `accum`.
    ///
    /// `node` is the node-set entry the application started from; it
    /// carries the `skip_contained_object` flag across the recursive
    /// descent re-application, which is why it rides along separately
    /// from the `(location, val)` pair being visited.
    pub fn select<'v>(
        &self,
        node: &mut Node<'v>,
        location: &Location,
        val: &NodeVal<'v>,
        root: &'v Value,
        mode: PathMode,
        accum: &mut NodeSet<'v>,
    ) {
        match self {
            Selector::Name { name, .. } => select_name(name, location, val, mode, accum),
            Selector::Slice {
                start,
                positive_start,
                end,
                positive_end,
                undefined_end,
                step,
                positive_step,
            } => {
                if let Value::Array(array) = val.get() {
                    let size = array.len();
                    let start = if *positive_start {
                        *start
                    } else {
                        size.wrapping_sub(*start)
                    };
                    let end = if *undefined_end {
                        size
                    } else if *positive_end {
                        *end
                    } else {
                        size.wrapping_sub(*end)
                    };

                    if *positive_step {
                        slice_forward(start, end, *step, size, location, val, mode, accum);
                    } else {
                        slice_backward(start, end, *step, size, location, val, mode, accum);
                    }
                }
            }
            Selector::Expr { expr } => {
                let index = expr.eval(root, val.get());
                if let Some(i) = index.as_u64() {
                    if let Value::Array(array) = val.get() {
                        let i = i as usize;
                        if i < array.len() {
                            push_element(location, val, i, mode, accum);
                        }
                    }
                } else if let Some(name) = index.as_str() {
                    select_name(name, location, val, mode, accum);
                }
            }
            Selector::Filter { expr } => match val.get() {
                Value::Array(array) => {
                    node.skip_contained_object = true;
                    for (i, element) in array.iter().enumerate() {
                        if expr.exists(root, element) {
                            push_element(location, val, i, mode, accum);
                        }
                    }
                }
                Value::Object(_) => {
                    if !node.skip_contained_object {
                        if expr.exists(root, val.get()) {
                            accum.push(Node::new(location.clone(), val.clone()));
                        }
                    } else {
                        node.skip_contained_object = false;
                    }
                }
                _ => {}
            },
        }
    }
}

/// Selects by name against one value: object member lookup, array index
/// (negative from the end) or `length`, string code-point index or
/// `length`. Shared by the bracket name selector and the unquoted-name
/// pass.
pub(crate) fn select_name<'v>(
    name: &str,
    location: &Location,
    val: &NodeVal<'v>,
    mode: PathMode,
    accum: &mut NodeSet<'v>,
) {
    match val.get() {
        Value::Object(map) => {
            if map.contains_key(name) {
                accum.push(Node::new(
                    mode.extend(location, PathElement::Name(name.to_string())),
                    val.child_key(name).expect("member checked above"),
                ));
            }
        }
        Value::Array(array) => {
            let size = array.len();
            if let Some((pos, positive)) = try_string_to_index(name) {
                let index = if positive { pos } else { size.wrapping_sub(pos) };
                if index < size {
                    push_element(location, val, index, mode, accum);
                }
            } else if name == "length" && size > 0 {
                accum.push(Node::synthesized(
                    mode.extend(location, PathElement::Name(name.to_string())),
                    json!(size),
                ));
            }
        }
        Value::String(s) => {
            let count = s.chars().count();
            if let Some((pos, positive)) = try_string_to_index(name) {
                let index = if positive {
                    Some(pos)
                } else {
                    count.checked_sub(pos)
                };
                if let Some(i) = index {
                    if let Some(ch) = s.chars().nth(i) {
                        accum.push(Node::synthesized(
                            mode.extend(location, PathElement::Index(i)),
                            Value::String(ch.to_string()),
                        ));
                    }
                }
            } else if name == "length" && count > 0 {
                accum.push(Node::synthesized(
                    mode.extend(location, PathElement::Name(name.to_string())),
                    json!(count),
                ));
            }
        }
        _ => {}
    }
}

fn push_element<'v>(
    location: &Location,
    val: &NodeVal<'v>,
    index: usize,
    mode: PathMode,
    accum: &mut NodeSet<'v>,
) {
    if let Some(child) = val.child_index(index) {
        accum.push(Node::new(
            mode.extend(location, PathElement::Index(index)),
            child,
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn slice_forward<'v>(
    start: usize,
    end: usize,
    step: usize,
    size: usize,
    location: &Location,
    val: &NodeVal<'v>,
    mode: PathMode,
    accum: &mut NodeSet<'v>,
) {
    if step == 0 {
        return;
    }
    let mut j = start;
    while j < end {
        if j >= size {
            break;
        }
        push_element(location, val, j, mode, accum);
        j = j.wrapping_add(step);
    }
}

// Iterates descending: j runs from end-1 down to start, stepping by the
// magnitude of the (negative) step. Out-of-range positions that unsigned
// arithmetic can produce are filtered by the `j < size` guard.
#[allow(clippy::too_many_arguments)]
fn slice_backward<'v>(
    start: usize,
    end: usize,
    step: usize,
    size: usize,
    location: &Location,
    val: &NodeVal<'v>,
    mode: PathMode,
    accum: &mut NodeSet<'v>,
) {
    if step == 0 {
        return;
    }
    let floor = start.wrapping_add(step).wrapping_sub(1);
    let mut j = end.wrapping_add(step).wrapping_sub(1);
    while j > floor {
        j = j.wrapping_sub(step);
        if j < size {
            push_element(location, val, j, mode, accum);
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name, .. } => write!(f, "'{}'", name),
            Selector::Slice {
                start,
                positive_start,
                end,
                positive_end,
                undefined_end,
                step,
                positive_step,
            } => {
                let sign = |positive: bool| if positive { "" } else { "-" };
                write!(f, "{}{}:", sign(*positive_start), start)?;
                if !undefined_end {
                    write!(f, "{}{}", sign(*positive_end), end)?;
                }
                write!(f, ":{}{}", sign(*positive_step), step)
            }
            Selector::Expr { expr } => write!(f, "{}", expr),
            Selector::Filter { expr } => write!(f, "{}", expr),
        }
    }
}
