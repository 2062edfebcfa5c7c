//! The structured-event sink bridging binary views to JSON output: a
//! handler trait receiving document events in depth-first order, a JSON
//! text serializer, and a generic-value builder.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value};

/// Receiver for a depth-first stream of document events.
///
/// All methods default to no-ops so a handler only implements the
/// events it cares about.
pub trait ContentHandler {
    fn begin_document(&mut self) {}
    fn end_document(&mut self) {}
    fn begin_array(&mut self, _len: usize) {}
    fn end_array(&mut self) {}
    fn begin_object(&mut self, _len: usize) {}
    fn end_object(&mut self) {}
    fn name(&mut self, _key: &str) {}
    fn string_value(&mut self, _value: &str) {}
    fn byte_string_value(&mut self, _value: &[u8]) {}
    fn integer_value(&mut self, _value: i64) {}
    fn uinteger_value(&mut self, _value: u64) {}
    fn double_value(&mut self, _value: f64) {}
    fn bool_value(&mut self, _value: bool) {}
    fn null_value(&mut self) {}
    fn bignum_value(&mut self, _sign: i32, _bytes: &[u8]) {}
}

/// Whether serialized output is indented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indenting {
    None,
    Indent,
}

/// Formatting options for [`JsonWriter`].
#[derive(Debug, Clone)]
pub struct JsonOptions {
    pub indent_width: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions { indent_width: 2 }
    }
}

/// Serializes the event stream to JSON text.
///
/// Byte strings render as base64 strings; bignums render as bare
/// decimal integers.
pub struct JsonWriter {
    out: String,
    options: JsonOptions,
    indenting: Indenting,
    /// One entry per open container: whether it has items already.
    stack: Vec<bool>,
    after_name: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::with_options(JsonOptions::default(), Indenting::None)
    }

    pub fn with_options(options: JsonOptions, indenting: Indenting) -> Self {
        JsonWriter {
            out: String::new(),
            options,
            indenting,
            stack: Vec::new(),
            after_name: false,
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn pretty(&self) -> bool {
        self.indenting == Indenting::Indent
    }

    fn newline_indent(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth * self.options.indent_width {
            self.out.push(' ');
        }
    }

    /// Separator before a value or a name: a comma after a sibling, a
    /// fresh indented line when pretty. A value directly after its name
    /// needs neither.
    fn begin_item(&mut self) {
        if self.after_name {
            self.after_name = false;
            return;
        }
        if let Some(has_items) = self.stack.last_mut() {
            let had = *has_items;
            *has_items = true;
            if had {
                self.out.push(',');
            }
            if self.pretty() {
                let depth = self.stack.len();
                self.newline_indent(depth);
            }
        }
    }

    fn close_container(&mut self, closer: char) {
        let had_items = self.stack.pop().unwrap_or(false);
        if self.pretty() && had_items {
            let depth = self.stack.len();
            self.newline_indent(depth);
        }
        self.out.push(closer);
    }

    fn write_escaped(&mut self, s: &str) {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                ch if (ch as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", ch as u32));
                }
                ch => self.out.push(ch),
            }
        }
        self.out.push('"');
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHandler for JsonWriter {
    fn begin_array(&mut self, _len: usize) {
        self.begin_item();
        self.out.push('[');
        self.stack.push(false);
    }

    fn end_array(&mut self) {
        self.close_container(']');
    }

    fn begin_object(&mut self, _len: usize) {
        self.begin_item();
        self.out.push('{');
        self.stack.push(false);
    }

    fn end_object(&mut self) {
        self.close_container('}');
    }

    fn name(&mut self, key: &str) {
        self.begin_item();
        self.write_escaped(key);
        self.out.push(':');
        if self.pretty() {
            self.out.push(' ');
        }
        self.after_name = true;
    }

    fn string_value(&mut self, value: &str) {
        self.begin_item();
        self.write_escaped(value);
    }

    fn byte_string_value(&mut self, value: &[u8]) {
        self.begin_item();
        self.out.push('"');
        self.out.push_str(&BASE64.encode(value));
        self.out.push('"');
    }

    fn integer_value(&mut self, value: i64) {
        self.begin_item();
        self.out.push_str(&value.to_string());
    }

    fn uinteger_value(&mut self, value: u64) {
        self.begin_item();
        self.out.push_str(&value.to_string());
    }

    fn double_value(&mut self, value: f64) {
        self.begin_item();
        if !value.is_finite() {
            self.out.push_str("null");
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            self.out.push_str(&format!("{:.1}", value));
        } else {
            self.out.push_str(&value.to_string());
        }
    }

    fn bool_value(&mut self, value: bool) {
        self.begin_item();
        self.out.push_str(if value { "true" } else { "false" });
    }

    fn null_value(&mut self) {
        self.begin_item();
        self.out.push_str("null");
    }

    fn bignum_value(&mut self, sign: i32, bytes: &[u8]) {
        self.begin_item();
        self.out.push_str(&bignum_to_decimal(sign, bytes));
    }
}

/// Builds a [`serde_json::Value`] from the event stream.
///
/// Bignums become decimal strings (there is no arbitrary-precision
/// number form), byte strings base64 strings.
pub struct ValueBuilder {
    stack: Vec<Container>,
    result: Option<Value>,
}

enum Container {
    Array(Vec<Value>),
    Object(Map<String, Value>, Option<String>),
}

impl ValueBuilder {
    pub fn new() -> Self {
        ValueBuilder {
            stack: Vec::new(),
            result: None,
        }
    }

    /// The built value; null when the stream carried no value event.
    pub fn into_value(self) -> Value {
        self.result.unwrap_or(Value::Null)
    }

    fn attach(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(Container::Array(items)) => items.push(value),
            Some(Container::Object(map, key)) => {
                if let Some(key) = key.take() {
                    map.insert(key, value);
                }
            }
            None => self.result = Some(value),
        }
    }
}

impl Default for ValueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHandler for ValueBuilder {
    fn begin_array(&mut self, len: usize) {
        self.stack.push(Container::Array(Vec::with_capacity(len)));
    }

    fn end_array(&mut self) {
        if let Some(Container::Array(items)) = self.stack.pop() {
            self.attach(Value::Array(items));
        }
    }

    fn begin_object(&mut self, _len: usize) {
        self.stack.push(Container::Object(Map::new(), None));
    }

    fn end_object(&mut self) {
        if let Some(Container::Object(map, _)) = self.stack.pop() {
            self.attach(Value::Object(map));
        }
    }

    fn name(&mut self, key: &str) {
        if let Some(Container::Object(_, pending)) = self.stack.last_mut() {
            *pending = Some(key.to_string());
        }
    }

    fn string_value(&mut self, value: &str) {
        self.attach(Value::String(value.to_string()));
    }

    fn byte_string_value(&mut self, value: &[u8]) {
        self.attach(Value::String(BASE64.encode(value)));
    }

    fn integer_value(&mut self, value: i64) {
        self.attach(Value::Number(Number::from(value)));
    }

    fn uinteger_value(&mut self, value: u64) {
        self.attach(Value::Number(Number::from(value)));
    }

    fn double_value(&mut self, value: f64) {
        self.attach(
            Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
    }

    fn bool_value(&mut self, value: bool) {
        self.attach(Value::Bool(value));
    }

    fn null_value(&mut self) {
        self.attach(Value::Null);
    }

    fn bignum_value(&mut self, sign: i32, bytes: &[u8]) {
        self.attach(Value::String(bignum_to_decimal(sign, bytes)));
    }
}

/// Converts a big-endian magnitude to decimal text by repeated division.
fn bignum_to_decimal(sign: i32, bytes: &[u8]) -> String {
    if bytes.iter().all(|&b| b == 0) {
        return String::from("0");
    }

    let mut magnitude = bytes.to_vec();
    let mut digits = Vec::new();
    while magnitude.iter().any(|&b| b != 0) {
        let mut remainder: u32 = 0;
        for byte in magnitude.iter_mut() {
            let current = (remainder << 8) | *byte as u32;
            *byte = (current / 10) as u8;
            remainder = current % 10;
        }
        digits.push(b'0' + remainder as u8);
    }
    if sign < 0 {
        digits.push(b'-');
    }
    digits.reverse();
    String::from_utf8(digits).expect("decimal digits are ascii")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_map(handler: &mut dyn ContentHandler) {
        handler.begin_document();
        handler.begin_object(2);
        handler.name("a");
        handler.uinteger_value(1);
        handler.name("xs");
        handler.begin_array(3);
        handler.integer_value(-1);
        handler.string_value("two");
        handler.null_value();
        handler.end_array();
        handler.end_object();
        handler.end_document();
    }

    #[test]
    fn writer_compact() {
        let mut writer = JsonWriter::new();
        feed_map(&mut writer);
        assert_eq!(writer.into_string(), r#"{"a":1,"xs":[-1,"two",null]}"#);
    }

    #[test]
    fn writer_pretty() {
        let mut writer = JsonWriter::with_options(JsonOptions::default(), Indenting::Indent);
        feed_map(&mut writer);
        let expected = "{\n  \"a\": 1,\n  \"xs\": [\n    -1,\n    \"two\",\n    null\n  ]\n}";
        assert_eq!(writer.into_string(), expected);
    }

    #[test]
    fn writer_escapes_strings() {
        let mut writer = JsonWriter::new();
        writer.string_value("a\"b\\c\nd\u{1}");
        assert_eq!(writer.into_string(), "\"a\\\"b\\\\c\\nd\\u0001\"");
    }

    #[test]
    fn writer_doubles_stay_doubles() {
        let mut writer = JsonWriter::new();
        writer.double_value(3.0);
        assert_eq!(writer.into_string(), "3.0");

        let mut writer = JsonWriter::new();
        writer.double_value(f64::NAN);
        assert_eq!(writer.into_string(), "null");
    }

    #[test]
    fn writer_empty_containers() {
        let mut writer = JsonWriter::with_options(JsonOptions::default(), Indenting::Indent);
        writer.begin_array(0);
        writer.end_array();
        assert_eq!(writer.into_string(), "[]");
    }

    #[test]
    fn builder_roundtrips_with_writer() {
        let mut writer = JsonWriter::new();
        feed_map(&mut writer);
        let mut builder = ValueBuilder::new();
        feed_map(&mut builder);

        let from_text: Value = serde_json::from_str(&writer.into_string()).unwrap();
        assert_eq!(builder.into_value(), from_text);
    }

    #[test]
    fn builder_builds_nested_values() {
        let mut builder = ValueBuilder::new();
        feed_map(&mut builder);
        assert_eq!(
            builder.into_value(),
            json!({"a": 1, "xs": [-1, "two", null]})
        );
    }

    #[test]
    fn builder_of_empty_stream_is_null() {
        let builder = ValueBuilder::new();
        assert_eq!(builder.into_value(), Value::Null);
    }

    #[test]
    fn byte_strings_render_base64() {
        let mut writer = JsonWriter::new();
        writer.byte_string_value(&[1, 2, 3]);
        assert_eq!(writer.into_string(), "\"AQID\"");
    }

    #[test]
    fn bignum_decimal_conversion() {
        // 18446744073709551616 = 2^64 = 0x01 00.. (9 bytes)
        let bytes = [0x01, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(bignum_to_decimal(1, &bytes), "18446744073709551616");
        assert_eq!(bignum_to_decimal(-1, &bytes), "-18446744073709551616");
        assert_eq!(bignum_to_decimal(1, &[0]), "0");
        assert_eq!(bignum_to_decimal(1, &[0xff]), "255");
    }
}
