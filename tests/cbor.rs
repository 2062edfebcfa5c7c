use graver_json::cbor::{deep_eq, CborView, MajorType};
use graver_json::errors::CborError;
use graver_json::{ContentHandler, Indenting, JsonOptions, JsonWriter};
use serde_json::json;

/// Records the event stream for order assertions.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ContentHandler for Recorder {
    fn begin_document(&mut self) {
        self.events.push(String::from("begin_document"));
    }
    fn end_document(&mut self) {
        self.events.push(String::from("end_document"));
    }
    fn begin_array(&mut self, len: usize) {
        self.events.push(format!("begin_array({})", len));
    }
    fn end_array(&mut self) {
        self.events.push(String::from("end_array"));
    }
    fn begin_object(&mut self, len: usize) {
        self.events.push(format!("begin_object({})", len));
    }
    fn end_object(&mut self) {
        self.events.push(String::from("end_object"));
    }
    fn name(&mut self, key: &str) {
        self.events.push(format!("name({})", key));
    }
    fn string_value(&mut self, value: &str) {
        self.events.push(format!("string({})", value));
    }
    fn byte_string_value(&mut self, value: &[u8]) {
        self.events.push(format!("byte_string({:?})", value));
    }
    fn integer_value(&mut self, value: i64) {
        self.events.push(format!("integer({})", value));
    }
    fn uinteger_value(&mut self, value: u64) {
        self.events.push(format!("uinteger({})", value));
    }
    fn double_value(&mut self, value: f64) {
        self.events.push(format!("double({})", value));
    }
    fn bool_value(&mut self, value: bool) {
        self.events.push(format!("bool({})", value));
    }
    fn null_value(&mut self) {
        self.events.push(String::from("null"));
    }
    fn bignum_value(&mut self, sign: i32, bytes: &[u8]) {
        self.events.push(format!("bignum({}, {:?})", sign, bytes));
    }
}

// {"a": 1, "b": 2}
const MAP: [u8; 7] = [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0x02];

#[test]
fn map_view_scenario() {
    let view = CborView::new(&MAP);
    assert_eq!(view.size(), 2);
    assert_eq!(view.at_key("a").unwrap().as_uinteger(), Ok(1));
    assert!(view.has_key("b"));
    assert!(!view.has_key("c"));
}

#[test]
fn map_dump_event_order() {
    let mut recorder = Recorder::default();
    CborView::new(&MAP).dump(&mut recorder).unwrap();
    assert_eq!(
        recorder.events,
        vec![
            "begin_document",
            "begin_object(2)",
            "name(a)",
            "uinteger(1)",
            "name(b)",
            "uinteger(2)",
            "end_object",
            "end_document",
        ]
    );
}

#[test]
fn nested_document_dump() {
    // {"xs": [1, -2, "three", true, null, 1.5]}
    let bytes = [
        0xa1, 0x62, b'x', b's', 0x86, 0x01, 0x21, 0x65, b't', b'h', b'r', b'e', b'e', 0xf5, 0xf6,
        0xf9, 0x3e, 0x00,
    ];
    let view = CborView::new(&bytes);
    assert_eq!(
        view.to_value().unwrap(),
        json!({"xs": [1, -2, "three", true, null, 1.5]})
    );
    assert_eq!(
        view.to_json().unwrap(),
        r#"{"xs":[1,-2,"three",true,null,1.5]}"#
    );
}

#[test]
fn pretty_json_dump() {
    let view = CborView::new(&MAP);
    assert_eq!(
        view.to_json_pretty().unwrap(),
        "{\n  \"a\": 1,\n  \"b\": 2\n}"
    );
    let wide = view
        .to_json_with(&JsonOptions { indent_width: 4 }, Indenting::Indent)
        .unwrap();
    assert_eq!(wide, "{\n    \"a\": 1,\n    \"b\": 2\n}");
}

#[test]
fn bignum_tags() {
    // tag 2 wrapping h'010000000000000000' = 2^64
    let positive = [0xc2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
    let mut recorder = Recorder::default();
    CborView::new(&positive).dump(&mut recorder).unwrap();
    assert_eq!(
        recorder.events[1],
        "bignum(1, [1, 0, 0, 0, 0, 0, 0, 0, 0])"
    );
    assert_eq!(
        CborView::new(&positive).to_json().unwrap(),
        "18446744073709551616"
    );

    let negative = [0xc3, 0x42, 0x01, 0x00];
    let mut recorder = Recorder::default();
    CborView::new(&negative).dump(&mut recorder).unwrap();
    assert_eq!(recorder.events[1], "bignum(-1, [1, 0])");
}

#[test]
fn dump_matches_item_by_item_decoding() {
    // [{"k": [true]}, "s", 255] visited depth-first
    let bytes = [
        0x83, 0xa1, 0x61, b'k', 0x81, 0xf5, 0x61, b's', 0x18, 0xff,
    ];
    let mut recorder = Recorder::default();
    CborView::new(&bytes).dump(&mut recorder).unwrap();
    assert_eq!(
        recorder.events,
        vec![
            "begin_document",
            "begin_array(3)",
            "begin_object(1)",
            "name(k)",
            "begin_array(1)",
            "bool(true)",
            "end_array",
            "end_object",
            "string(s)",
            "uinteger(255)",
            "end_array",
            "end_document",
        ]
    );
}

#[test]
fn indefinite_length_containers() {
    // [_ 1, {_ "a": 2}, "tail"]
    let bytes = [
        0x9f, 0x01, 0xbf, 0x61, b'a', 0x02, 0xff, 0x64, b't', b'a', b'i', b'l', 0xff,
    ];
    let view = CborView::new(&bytes);
    assert_eq!(view.size(), 3);
    assert_eq!(view.at(0).unwrap().as_uinteger(), Ok(1));
    assert!(view.at(1).unwrap().is_object());
    assert_eq!(view.at(1).unwrap().at_key("a").unwrap().as_uinteger(), Ok(2));
    assert_eq!(view.at(2).unwrap().as_string(), Ok(String::from("tail")));

    assert_eq!(view.to_value().unwrap(), json!([1, {"a": 2}, "tail"]));
}

#[test]
fn indefinite_string_chunks_concatenate() {
    // (_ "str", "eaming")
    let bytes = [
        0x7f, 0x63, b's', b't', b'r', 0x66, b'e', b'a', b'm', b'i', b'n', b'g', 0xff,
    ];
    let view = CborView::new(&bytes);
    assert!(view.is_string());
    assert_eq!(view.as_string(), Ok(String::from("streaming")));
    assert_eq!(view.size(), 9);
}

#[test]
fn major_types() {
    assert_eq!(CborView::new(&[0x01]).major_type(), MajorType::UnsignedInteger);
    assert_eq!(CborView::new(&[0x21]).major_type(), MajorType::NegativeInteger);
    assert_eq!(CborView::new(&[0x41, 0]).major_type(), MajorType::ByteString);
    assert_eq!(CborView::new(&[0x61, b'a']).major_type(), MajorType::TextString);
    assert_eq!(CborView::new(&[0x80]).major_type(), MajorType::Array);
    assert_eq!(CborView::new(&[0xa0]).major_type(), MajorType::Map);
    assert_eq!(CborView::new(&[0xc2, 0x41, 1]).major_type(), MajorType::SemanticTag);
    assert_eq!(CborView::new(&[0xf6]).major_type(), MajorType::Simple);
}

#[test]
fn sub_views_borrow_the_same_buffer() {
    let view = CborView::new(&MAP);
    let a = view.at_key("a").unwrap();
    let b = view.at_key("a").unwrap();
    assert_eq!(a, b);
    assert!(deep_eq(&a, &b));

    let elements: Vec<_> = view
        .object_range()
        .unwrap()
        .map(|entry| entry.unwrap().1)
        .collect();
    assert_eq!(elements[0], a);
}

#[test]
fn at_equivalence_with_size() {
    // [10, 20, 30]
    let bytes = [0x83, 0x0a, 0x14, 0x1e];
    let view = CborView::new(&bytes);
    let n = view.size();
    for k in 0..n {
        assert!(view.at(k).is_ok());
    }
    assert_eq!(view.at(n), Err(CborError::IndexOutOfRange));
}

#[test]
fn truncated_input_errors() {
    // header says 3 elements, only 2 present
    let bytes = [0x83, 0x01, 0x02];
    let view = CborView::new(&bytes);
    assert!(view.at(2).is_err());

    let mut recorder = Recorder::default();
    assert!(matches!(
        CborView::new(&bytes).dump(&mut recorder),
        Err(CborError::Decode { .. })
    ));
}

#[test]
fn byte_string_dump_renders_base64() {
    let bytes = [0x43, 1, 2, 3];
    assert_eq!(CborView::new(&bytes).to_json().unwrap(), "\"AQID\"");
    assert_eq!(CborView::new(&bytes).to_value().unwrap(), json!("AQID"));
}

#[test]
fn writer_and_builder_agree() {
    let documents: [&[u8]; 4] = [
        &MAP,
        &[0x83, 0x0a, 0x82, 0x14, 0x15, 0x1e],
        &[0xf9, 0x3e, 0x00],
        &[0x9f, 0x01, 0xbf, 0x61, b'a', 0x02, 0xff, 0xff],
    ];
    for bytes in documents {
        let view = CborView::new(bytes);
        let mut writer = JsonWriter::new();
        view.dump(&mut writer).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&writer.into_string()).unwrap();
        assert_eq!(parsed, view.to_value().unwrap());
    }
}
