//! JSONPath queries and zero-copy CBOR views for JSON-family data.
//!
//! Two cores live here. The [`jsonpath`] module is a query engine over
//! [`serde_json::Value`] documents: given a root and a path expression
//! it produces the matched values, the normalized paths that identify
//! them, or replaces every match in place.
//!
//! ```
//! use graver_json::jsonpath::{json_query, ResultType};
//! use serde_json::json;
//!
//! fn main() -> Result<(), graver_json::JsonPathError> {
//!     let root = json!({"store": {"book": [
//!         {"title": "Sayings of the Century", "price": 8.95},
//!         {"title": "Moby Dick", "price": 8.99}
//!     ]}});
//!
//!     let titles = json_query(&root, "$.store.book[*].title", ResultType::Value)?;
//!     assert_eq!(titles, json!(["Sayings of the Century", "Moby Dick"]));
//!
//!     let paths = json_query(&root, "$..price", ResultType::Path)?;
//!     assert_eq!(paths, json!([
//!         "$['store']['book'][0]['price']",
//!         "$['store']['book'][1]['price']"
//!     ]));
//!     Ok(())
//! }
//! ```
//!
//! The [`cbor`] module is a non-owning inspector over CBOR byte
//! buffers: typed accessors, keyed and indexed descent, lazy iteration,
//! and a streaming dump into the [`events`] sink that bridges to JSON
//! text or to a generic value.
//!
//! ```
//! use graver_json::cbor::CborView;
//!
//! // {"a": 1, "b": 2}
//! let buffer = [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0x02];
//! let view = CborView::new(&buffer);
//! assert!(view.has_key("b"));
//! assert_eq!(view.to_json().unwrap(), r#"{"a":1,"b":2}"#);
//! ```

pub mod cbor;
pub mod errors;
pub mod events;
pub mod jsonpath;

pub use cbor::CborView;
pub use errors::{CborError, JsonPathError, JsonPathErrorKind};
pub use events::{ContentHandler, Indenting, JsonOptions, JsonWriter, ValueBuilder};
pub use jsonpath::{json_query, json_replace, ResultType};
