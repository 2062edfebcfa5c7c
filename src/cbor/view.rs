use std::fmt;

use serde_json::Value;

use crate::cbor::decode;
use crate::errors::CborError;
use crate::events::{ContentHandler, Indenting, JsonOptions, JsonWriter, ValueBuilder};

/// The high three bits of a CBOR item's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    UnsignedInteger,
    NegativeInteger,
    ByteString,
    TextString,
    Array,
    Map,
    SemanticTag,
    Simple,
}

impl MajorType {
    fn from_byte(byte: u8) -> Self {
        match decode::major(byte) {
            0 => MajorType::UnsignedInteger,
            1 => MajorType::NegativeInteger,
            2 => MajorType::ByteString,
            3 => MajorType::TextString,
            4 => MajorType::Array,
            5 => MajorType::Map,
            6 => MajorType::SemanticTag,
            _ => MajorType::Simple,
        }
    }
}

/// A non-owning view over exactly one CBOR item's byte range.
///
/// Copying is two pointers; nothing is decoded until asked for.
/// Equality compares the pointer pair — two views are equal when they
/// look at the same bytes of the same buffer. Use [`deep_eq`] for
/// content comparison.
#[derive(Clone, Copy)]
pub struct CborView<'a> {
    bytes: &'a [u8],
}

/// Byte-for-byte content equality between two views.
pub fn deep_eq(lhs: &CborView<'_>, rhs: &CborView<'_>) -> bool {
    lhs.bytes == rhs.bytes
}

impl PartialEq for CborView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.bytes.as_ptr(), other.bytes.as_ptr())
            && self.bytes.len() == other.bytes.len()
    }
}

impl fmt::Debug for CborView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CborView({} bytes)", self.bytes.len())
    }
}

impl<'a> CborView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        CborView { bytes }
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn buflen(&self) -> usize {
        self.bytes.len()
    }

    /// The item's first byte. An empty view reads as the `undefined`
    /// simple value.
    pub fn type_byte(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0xf7)
    }

    pub fn major_type(&self) -> MajorType {
        MajorType::from_byte(self.type_byte())
    }

    pub fn is_null(&self) -> bool {
        self.type_byte() == 0xf6
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.type_byte(), 0xf4 | 0xf5)
    }

    pub fn is_double(&self) -> bool {
        matches!(self.type_byte(), 0xf9 | 0xfa | 0xfb)
    }

    pub fn is_string(&self) -> bool {
        self.major_type() == MajorType::TextString
    }

    pub fn is_byte_string(&self) -> bool {
        self.major_type() == MajorType::ByteString
    }

    pub fn is_array(&self) -> bool {
        self.major_type() == MajorType::Array
    }

    pub fn is_object(&self) -> bool {
        self.major_type() == MajorType::Map
    }

    pub fn is_uinteger(&self) -> bool {
        self.major_type() == MajorType::UnsignedInteger
    }

    /// Major type 1, or major type 0 with a value that fits `i64`.
    pub fn is_integer(&self) -> bool {
        match self.major_type() {
            MajorType::NegativeInteger => true,
            MajorType::UnsignedInteger => decode::get_integer(self.bytes).is_some(),
            _ => false,
        }
    }

    /// True iff a container or string has length zero; scalars are
    /// never empty.
    pub fn empty(&self) -> bool {
        if self.is_array() || self.is_object() || self.is_string() || self.is_byte_string() {
            self.size() == 0
        } else {
            false
        }
    }

    /// The container's element count (pairs for maps) or the string's
    /// byte length; zero for anything else.
    pub fn size(&self) -> usize {
        decode::get_size(self.bytes).map_or(0, |(len, _)| len)
    }

    /// A sub-view over the `index`-th element of an array, found by
    /// walking the preceding siblings.
    pub fn at(&self, index: usize) -> Result<CborView<'a>, CborError> {
        if !self.is_array() {
            return Err(CborError::NotAnArray);
        }
        if index >= self.size() {
            return Err(CborError::IndexOutOfRange);
        }

        let (_, mut pos) = decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        for _ in 0..index {
            pos += self.walk_at(pos)?;
        }
        let len = self.walk_at(pos)?;
        Ok(CborView::new(&self.bytes[pos..pos + len]))
    }

    /// A sub-view over the value at the first key equal to `key`.
    pub fn at_key(&self, key: &str) -> Result<CborView<'a>, CborError> {
        if !self.is_object() {
            return Err(CborError::NotAnObject);
        }

        let (len, mut pos) = decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        for _ in 0..len {
            let (entry_key, advanced) =
                decode::get_text_string(&self.bytes[pos..]).ok_or(CborError::Decode { offset: pos })?;
            pos += advanced;

            let value_len = self.walk_at(pos)?;
            if entry_key == key {
                return Ok(CborView::new(&self.bytes[pos..pos + value_len]));
            }
            pos += value_len;
        }
        Err(CborError::KeyNotFound)
    }

    /// Whether a map contains `key`. False for non-maps and for maps
    /// that cannot be decoded.
    pub fn has_key(&self, key: &str) -> bool {
        if !self.is_object() {
            return false;
        }
        self.at_key(key).is_ok()
    }

    pub fn as_bool(&self) -> Result<bool, CborError> {
        match self.type_byte() {
            0xf5 => Ok(true),
            0xf4 => Ok(false),
            _ => Err(CborError::NotABool),
        }
    }

    pub fn as_integer(&self) -> Result<i64, CborError> {
        decode::get_integer(self.bytes)
            .map(|(v, _)| v)
            .ok_or(CborError::NotAnInteger)
    }

    pub fn as_uinteger(&self) -> Result<u64, CborError> {
        decode::get_uinteger(self.bytes)
            .map(|(v, _)| v)
            .ok_or(CborError::NotAnUinteger)
    }

    /// Double conversion; integer and unsigned-integer forms widen.
    pub fn as_double(&self) -> Result<f64, CborError> {
        if self.is_double() {
            decode::get_double(self.bytes)
                .map(|(v, _)| v)
                .ok_or(CborError::UnexpectedEof)
        } else if self.is_uinteger() {
            self.as_uinteger().map(|v| v as f64)
        } else if self.is_integer() {
            self.as_integer().map(|v| v as f64)
        } else {
            Err(CborError::NotADouble)
        }
    }

    pub fn as_string(&self) -> Result<String, CborError> {
        decode::get_text_string(self.bytes)
            .map(|(v, _)| v)
            .ok_or(CborError::NotAString)
    }

    /// A lazy iterator over an array's elements.
    pub fn array_range(&self) -> Result<ArrayRange<'a>, CborError> {
        if !self.is_array() {
            return Err(CborError::NotAnArray);
        }
        let (_, begin) = decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        let end = decode::walk_array(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        Ok(ArrayRange {
            bytes: self.bytes,
            pos: begin,
            end,
        })
    }

    /// A lazy iterator over a map's key/value pairs.
    pub fn object_range(&self) -> Result<ObjectRange<'a>, CborError> {
        if !self.is_object() {
            return Err(CborError::NotAnObject);
        }
        let (_, begin) = decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        let end = decode::walk_object(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
        Ok(ObjectRange {
            bytes: self.bytes,
            pos: begin,
            end,
        })
    }

    /// Streams this item to `handler` as one document.
    pub fn dump(&self, handler: &mut dyn ContentHandler) -> Result<(), CborError> {
        handler.begin_document();
        self.dump_fragment(handler)?;
        handler.end_document();
        Ok(())
    }

    fn dump_fragment(&self, handler: &mut dyn ContentHandler) -> Result<(), CborError> {
        match self.major_type() {
            MajorType::UnsignedInteger => {
                handler.uinteger_value(self.as_uinteger()?);
            }
            MajorType::NegativeInteger => {
                handler.integer_value(self.as_integer()?);
            }
            MajorType::ByteString => {
                let (bytes, _) = decode::get_byte_string(self.bytes)
                    .ok_or(CborError::Decode { offset: 0 })?;
                handler.byte_string_value(&bytes);
            }
            MajorType::TextString => {
                let (text, _) = decode::get_text_string(self.bytes)
                    .ok_or(CborError::Decode { offset: 0 })?;
                handler.string_value(&text);
            }
            MajorType::Array => {
                let (len, mut pos) =
                    decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
                handler.begin_array(len);
                for _ in 0..len {
                    let item_len = self.walk_at(pos)?;
                    CborView::new(&self.bytes[pos..pos + item_len]).dump_fragment(handler)?;
                    pos += item_len;
                }
                handler.end_array();
            }
            MajorType::Map => {
                let (len, mut pos) =
                    decode::get_size(self.bytes).ok_or(CborError::Decode { offset: 0 })?;
                handler.begin_object(len);
                for _ in 0..len {
                    let (key, advanced) = decode::get_text_string(&self.bytes[pos..])
                        .ok_or(CborError::Decode { offset: pos })?;
                    handler.name(&key);
                    pos += advanced;

                    let value_len = self.walk_at(pos)?;
                    CborView::new(&self.bytes[pos..pos + value_len]).dump_fragment(handler)?;
                    pos += value_len;
                }
                handler.end_object();
            }
            MajorType::SemanticTag => {
                let tag = decode::additional_info(self.type_byte());
                if tag == 2 || tag == 3 {
                    let (bytes, _) = decode::get_byte_string(&self.bytes[1..])
                        .ok_or(CborError::Decode { offset: 1 })?;
                    let sign = if tag == 2 { 1 } else { -1 };
                    handler.bignum_value(sign, &bytes);
                }
                // other tags are transparent and emit nothing
            }
            MajorType::Simple => match self.type_byte() {
                0xf5 => handler.bool_value(true),
                0xf4 => handler.bool_value(false),
                0xf6 => handler.null_value(),
                0xf9 | 0xfa | 0xfb => handler.double_value(self.as_double()?),
                _ => {}
            },
        }
        Ok(())
    }

    /// Serializes to compact JSON text.
    pub fn to_json(&self) -> Result<String, CborError> {
        self.to_json_with(&JsonOptions::default(), Indenting::None)
    }

    /// Serializes to indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String, CborError> {
        self.to_json_with(&JsonOptions::default(), Indenting::Indent)
    }

    /// Serializes to JSON text with explicit formatting options.
    pub fn to_json_with(
        &self,
        options: &JsonOptions,
        indenting: Indenting,
    ) -> Result<String, CborError> {
        let mut writer = JsonWriter::with_options(options.clone(), indenting);
        self.dump(&mut writer)?;
        Ok(writer.into_string())
    }

    /// Materializes the item as a generic JSON value.
    pub fn to_value(&self) -> Result<Value, CborError> {
        let mut builder = ValueBuilder::new();
        self.dump(&mut builder)?;
        Ok(builder.into_value())
    }

    fn walk_at(&self, pos: usize) -> Result<usize, CborError> {
        let advanced = self
            .bytes
            .get(pos..)
            .and_then(decode::walk)
            .ok_or(CborError::Decode { offset: pos })?;
        if advanced == 0 {
            return Err(CborError::Decode { offset: pos });
        }
        Ok(advanced)
    }
}

/// Forward-only iterator over an array's elements; items borrow the
/// same buffer as the parent view.
pub struct ArrayRange<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Iterator for ArrayRange<'a> {
    type Item = Result<CborView<'a>, CborError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end || self.bytes[self.pos] == decode::BREAK {
            return None;
        }
        match self.bytes.get(self.pos..).and_then(decode::walk) {
            Some(len) if len > 0 => {
                let view = CborView::new(&self.bytes[self.pos..self.pos + len]);
                self.pos += len;
                Some(Ok(view))
            }
            _ => {
                let offset = self.pos;
                self.pos = self.end;
                Some(Err(CborError::Decode { offset }))
            }
        }
    }
}

/// Forward-only iterator over a map's key/value pairs.
pub struct ObjectRange<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Iterator for ObjectRange<'a> {
    type Item = Result<(CborView<'a>, CborView<'a>), CborError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end || self.bytes[self.pos] == decode::BREAK {
            return None;
        }

        let key_len = match self.bytes.get(self.pos..).and_then(decode::walk) {
            Some(len) if len > 0 => len,
            _ => {
                let offset = self.pos;
                self.pos = self.end;
                return Some(Err(CborError::Decode { offset }));
            }
        };
        let key = CborView::new(&self.bytes[self.pos..self.pos + key_len]);
        let value_pos = self.pos + key_len;

        match self.bytes.get(value_pos..).and_then(decode::walk) {
            Some(len) if len > 0 => {
                let value = CborView::new(&self.bytes[value_pos..value_pos + len]);
                self.pos = value_pos + len;
                Some(Ok((key, value)))
            }
            _ => {
                self.pos = self.end;
                Some(Err(CborError::Decode { offset: value_pos }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1, "b": 2}
    const MAP: [u8; 7] = [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0x02];

    #[test]
    fn map_queries() {
        let view = CborView::new(&MAP);
        assert!(view.is_object());
        assert_eq!(view.size(), 2);
        assert_eq!(view.at_key("a").unwrap().as_uinteger(), Ok(1));
        assert!(view.has_key("b"));
        assert!(!view.has_key("c"));
        assert_eq!(view.at_key("c"), Err(CborError::KeyNotFound));
    }

    #[test]
    fn array_descent() {
        // [10, [20, 21], 30]
        let bytes = [0x83, 0x0a, 0x82, 0x14, 0x15, 0x1e];
        let view = CborView::new(&bytes);
        assert!(view.is_array());
        assert_eq!(view.size(), 3);
        assert_eq!(view.at(0).unwrap().as_uinteger(), Ok(10));
        assert_eq!(view.at(1).unwrap().at(1).unwrap().as_uinteger(), Ok(21));
        assert_eq!(view.at(2).unwrap().as_uinteger(), Ok(30));
        assert_eq!(view.at(3), Err(CborError::IndexOutOfRange));
    }

    #[test]
    fn at_on_non_array_fails() {
        let view = CborView::new(&MAP);
        assert_eq!(view.at(0), Err(CborError::NotAnArray));
        assert_eq!(
            CborView::new(&[0x01]).at_key("a"),
            Err(CborError::NotAnObject)
        );
    }

    #[test]
    fn has_key_is_false_for_non_maps() {
        assert!(!CborView::new(&[0x01]).has_key("a"));
    }

    #[test]
    fn predicates() {
        assert!(CborView::new(&[0xf6]).is_null());
        assert!(CborView::new(&[0xf4]).is_bool());
        assert!(CborView::new(&[0xf9, 0x3e, 0x00]).is_double());
        assert!(CborView::new(&[0x63, b'a', b'b', b'c']).is_string());
        assert!(CborView::new(&[0x43, 1, 2, 3]).is_byte_string());
        assert!(CborView::new(&[0x01]).is_uinteger());
        assert!(CborView::new(&[0x20]).is_integer());
        // a u64 beyond i64::MAX is unsigned but not an integer
        let big = [0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let view = CborView::new(&big);
        assert!(view.is_uinteger());
        assert!(!view.is_integer());
    }

    #[test]
    fn empties() {
        assert!(CborView::new(&[0x80]).empty());
        assert!(CborView::new(&[0xa0]).empty());
        assert!(CborView::new(&[0x60]).empty());
        assert!(!CborView::new(&[0x01]).empty());
        assert!(!CborView::new(&MAP).empty());
    }

    #[test]
    fn scalar_conversions() {
        assert_eq!(CborView::new(&[0xf5]).as_bool(), Ok(true));
        assert_eq!(CborView::new(&[0x18, 0x2a]).as_uinteger(), Ok(42));
        assert_eq!(CborView::new(&[0x38, 0x29]).as_integer(), Ok(-42));
        assert_eq!(
            CborView::new(&[0x63, b'a', b'b', b'c']).as_string(),
            Ok(String::from("abc"))
        );
        assert_eq!(CborView::new(&[0x01]).as_bool(), Err(CborError::NotABool));
        assert_eq!(
            CborView::new(&[0xf5]).as_string(),
            Err(CborError::NotAString)
        );
    }

    #[test]
    fn as_double_widens_integers() {
        assert_eq!(CborView::new(&[0x18, 0x2a]).as_double(), Ok(42.0));
        assert_eq!(CborView::new(&[0x38, 0x29]).as_double(), Ok(-42.0));
        assert_eq!(
            CborView::new(&[0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]).as_double(),
            Ok(1.5)
        );
        assert_eq!(
            CborView::new(&[0x63, b'a', b'b', b'c']).as_double(),
            Err(CborError::NotADouble)
        );
    }

    #[test]
    fn array_range_iterates_lazily() {
        let bytes = [0x83, 0x0a, 0x82, 0x14, 0x15, 0x1e];
        let view = CborView::new(&bytes);
        let elements: Result<Vec<_>, _> = view.array_range().unwrap().collect();
        let elements = elements.unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].as_uinteger(), Ok(10));
        assert!(elements[1].is_array());
    }

    #[test]
    fn object_range_yields_key_value_views() {
        let view = CborView::new(&MAP);
        let entries: Result<Vec<_>, _> = view.object_range().unwrap().collect();
        let entries = entries.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.as_string(), Ok(String::from("a")));
        assert_eq!(entries[0].1.as_uinteger(), Ok(1));
        assert_eq!(entries[1].0.as_string(), Ok(String::from("b")));
    }

    #[test]
    fn object_range_over_indefinite_map() {
        // {_ "a": 1, "b": 2}
        let bytes = [0xbf, 0x61, b'a', 0x01, 0x61, b'b', 0x02, 0xff];
        let view = CborView::new(&bytes);
        assert_eq!(view.size(), 2);
        let entries: Result<Vec<_>, _> = view.object_range().unwrap().collect();
        assert_eq!(entries.unwrap().len(), 2);
        assert!(view.has_key("b"));
    }

    #[test]
    fn has_key_matches_object_range() {
        let view = CborView::new(&MAP);
        for key in ["a", "b", "c"] {
            let found = view
                .object_range()
                .unwrap()
                .filter_map(Result::ok)
                .any(|(k, _)| k.as_string().as_deref() == Ok(key));
            assert_eq!(view.has_key(key), found);
        }
    }

    #[test]
    fn equality_is_positional_deep_eq_is_content() {
        let other: [u8; 7] = MAP;
        let a = CborView::new(&MAP);
        let b = CborView::new(&MAP);
        let c = CborView::new(&other);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(deep_eq(&a, &c));
    }

    #[test]
    fn views_are_cheap_copies() {
        let view = CborView::new(&MAP);
        let copy = view;
        assert_eq!(view, copy);
    }
}
