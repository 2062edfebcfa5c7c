//! A zero-copy inspector over CBOR byte buffers.
//!
//! [`CborView`] borrows a buffer holding one well-formed CBOR item and
//! offers typed accessors, indexed and keyed descent, lazy iteration,
//! and a streaming [`dump`](CborView::dump) into a
//! [`ContentHandler`](crate::events::ContentHandler) — the bridge to
//! JSON output. Nothing is decoded until asked for and no intermediate
//! tree is ever built.
//!
//! ```
//! use graver_json::cbor::CborView;
//!
//! // {"a": 1, "b": 2}
//! let buffer = [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0x02];
//! let view = CborView::new(&buffer);
//! assert_eq!(view.size(), 2);
//! assert_eq!(view.at_key("a").unwrap().as_uinteger(), Ok(1));
//! assert_eq!(view.to_json().unwrap(), r#"{"a":1,"b":2}"#);
//! ```

pub mod decode;
pub mod view;

pub use view::{deep_eq, ArrayRange, CborView, MajorType, ObjectRange};
