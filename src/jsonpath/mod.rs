//! A JSONPath query engine over [`serde_json::Value`] documents.
//!
//! [`json_query`] returns either the matched values or the normalized
//! paths that identify them; [`json_replace`] assigns a new value at
//! every matched location.
//!
//! ```
//! use graver_json::jsonpath::{json_query, ResultType};
//! use serde_json::json;
//!
//! let root = json!({"store": {"book": [{"price": 5}, {"price": 10}]}});
//! let prices = json_query(&root, "$.store.book[*].price", ResultType::Value).unwrap();
//! assert_eq!(prices, json!([5, 10]));
//! ```

pub mod evaluator;
pub mod filter;
pub mod functions;
mod index;
pub mod node;
pub mod selectors;

use serde_json::Value;

use crate::errors::JsonPathError;
use evaluator::Evaluator;
use node::{Location, PathElement, PathMode};

/// What a query produces: the matched values, or the normalized paths
/// that identify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Value,
    Path,
}

/// Evaluates `path` against `root` and returns an array of results.
pub fn json_query(
    root: &Value,
    path: &str,
    result_type: ResultType,
) -> Result<Value, JsonPathError> {
    match result_type {
        ResultType::Value => {
            let mut evaluator = Evaluator::new(PathMode::Discard);
            evaluator.evaluate(root, path)?;
            Ok(Value::Array(evaluator.get_values()))
        }
        ResultType::Path => {
            let mut evaluator = Evaluator::new(PathMode::Build);
            evaluator.evaluate(root, path)?;
            Ok(Value::Array(
                evaluator
                    .get_normalized_paths()
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ))
        }
    }
}

/// Assigns a clone of `new_value` at every location `path` selects,
/// mutating `root` in place.
///
/// Locations that do not resolve against the document — synthesized
/// values such as an array's `length` — are skipped; there is nothing
/// in the document to assign to.
pub fn json_replace(root: &mut Value, path: &str, new_value: Value) -> Result<(), JsonPathError> {
    let locations = {
        let mut evaluator = Evaluator::new(PathMode::Build);
        evaluator.evaluate(&*root, path)?;
        evaluator.get_locations()
    };

    for location in locations {
        if let Some(target) = resolve_mut(root, &location) {
            *target = new_value.clone();
        }
    }
    Ok(())
}

fn resolve_mut<'a>(root: &'a mut Value, location: &Location) -> Option<&'a mut Value> {
    let mut current = root;
    for element in location {
        current = match element {
            PathElement::Name(name) => current.get_mut(name.as_str())?,
            PathElement::Index(index) => current.get_mut(*index)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_for_values() {
        let root = json!({"a": [10, 20, 30]});
        assert_eq!(
            json_query(&root, "$.a[1:]", ResultType::Value).unwrap(),
            json!([20, 30])
        );
    }

    #[test]
    fn query_for_paths() {
        let root = json!({"a": [10, 20, 30]});
        assert_eq!(
            json_query(&root, "$.a[1:]", ResultType::Path).unwrap(),
            json!(["$['a'][1]", "$['a'][2]"])
        );
    }

    #[test]
    fn replace_mutates_in_place() {
        let mut root = json!({"a": [{"b": 1}, {"b": 2}]});
        json_replace(&mut root, "$.a[*].b", json!(0)).unwrap();
        assert_eq!(root, json!({"a": [{"b": 0}, {"b": 0}]}));
    }

    #[test]
    fn replace_whole_document() {
        let mut root = json!({"a": 1});
        json_replace(&mut root, "$", json!(null)).unwrap();
        assert_eq!(root, json!(null));
    }

    #[test]
    fn replace_of_synthesized_value_is_a_no_op() {
        let mut root = json!({"a": [1, 2, 3]});
        json_replace(&mut root, "$.a.length", json!(99)).unwrap();
        assert_eq!(root, json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn replace_error_leaves_document_untouched() {
        let mut root = json!({"a": 1});
        assert!(json_replace(&mut root, "$ x", json!(2)).is_err());
        assert_eq!(root, json!({"a": 1}));
    }
}
