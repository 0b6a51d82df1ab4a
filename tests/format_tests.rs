//! Wire-format conformance: exact text and byte layouts.

use dson::{
    classify_unquoted, dson, from_binary, from_text, to_binary, to_binary_with_options,
    to_text, to_text_with_options, Binary, BinaryWriter, ClassId, DsonArray, DsonObject,
    DsonOptions, DsonValue, DsonWriter, ExtInt32, ExtString, FieldNumber, LineBuffer, ObjectRef,
    ObjectStyle, Scanned, TextWriter, Token, WireType,
};

fn text(value: &DsonValue) -> String {
    to_text(value).unwrap()
}

#[test]
fn test_unquoted_classification() {
    assert_eq!(classify_unquoted("true"), Token::Bool(true));
    assert_eq!(classify_unquoted("null"), Token::Null);
    assert_eq!(classify_unquoted("-17"), Token::Int32(-17));
    assert_eq!(classify_unquoted("2147483648"), Token::Int64(2_147_483_648));
    assert_eq!(classify_unquoted("1e3"), Token::Double(1000.0));
    assert_eq!(classify_unquoted("e3"), Token::UnquotedString("e3".into()));
    assert_eq!(classify_unquoted("NaN"), Token::UnquotedString("NaN".into()));
}

#[test]
fn test_strings_quoted_only_when_needed() {
    assert_eq!(
        text(&dson!(["plain", "two words", "true", "7", "", "a:b"])),
        r#"-- [plain, "two words", "true", "7", "", "a:b"]"#
    );
    assert_eq!(text(&dson!("tab\there")), r#"-- "tab\there""#);
}

#[test]
fn test_number_forms() {
    let value = DsonValue::Array(DsonArray::from(vec![
        DsonValue::Int32(-3),
        DsonValue::Int64(-3),
        DsonValue::Int64(i64::MIN),
        DsonValue::Float(0.25),
        DsonValue::Double(0.25),
        DsonValue::Double(f64::NAN),
    ]));
    assert_eq!(
        text(&value),
        "-- [-3, @L -3, -9223372036854775808, @f 0.25, 0.25, @d NaN]"
    );
    let back = from_text(&text(&value)).unwrap();
    let elements = &back.as_array().unwrap().elements;
    assert_eq!(elements[1], DsonValue::Int64(-3));
    assert!(matches!(elements[5], DsonValue::Double(d) if d.is_nan()));
}

#[test]
fn test_extension_sugar() {
    let value = DsonValue::Array(DsonArray::from(vec![
        DsonValue::Binary(Binary::new(1, vec![0x0a, 0xff])),
        DsonValue::ExtInt32(ExtInt32 {
            subtype: 2,
            value: -1,
        }),
        DsonValue::ExtString(ExtString {
            subtype: 5,
            value: "x y".into(),
        }),
        DsonValue::Reference(ObjectRef::local("r1")),
    ]));
    let written = text(&value);
    assert_eq!(
        written,
        r#"-- [@bin [1, 0aff], @ei [2, -1], @es [5, "x y"], @ref r1]"#
    );
    assert_eq!(from_text(&written).unwrap(), value);
}

#[test]
fn test_full_reference() {
    let reference = ObjectRef {
        namespace: "ns1".into(),
        local_id: "obj".into(),
        kind: 1,
        policy: 2,
    };
    let value = DsonValue::Reference(reference.clone());
    let back = from_text(&text(&value)).unwrap();
    assert_eq!(back, value);

    let parsed = from_text("-- @ref {localId: obj, ns: ns1, policy: 2, type: 1}").unwrap();
    assert_eq!(parsed, DsonValue::Reference(reference));
}

#[test]
fn test_indent_style() {
    let options = DsonOptions::new().with_style(ObjectStyle::Indent);
    let value = dson!({ "a": [1, 2], "b": {} });
    let written = to_text_with_options(&value, &options).unwrap();
    assert_eq!(
        written,
        "-- {\n--   a: [\n--     1,\n--     2\n--   ],\n--   b: {}\n-- }"
    );
    assert_eq!(from_text(&written).unwrap(), value);
}

#[test]
fn test_mixed_styles() {
    let mut writer = TextWriter::new(&DsonOptions::default());
    writer
        .write_start_object_styled(None, ObjectStyle::Indent)
        .unwrap();
    writer.write_name("row".to_string()).unwrap();
    writer.write_start_array(None).unwrap();
    writer.write_int32(1, WireType::VarInt).unwrap();
    writer.write_int32(2, WireType::VarInt).unwrap();
    writer.write_end_array().unwrap();
    writer.write_end_object().unwrap();
    assert_eq!(writer.into_string().unwrap(), "-- {\n--   row: [1, 2]\n-- }");
}

#[test]
fn test_soft_wrap_reads_back() {
    let options = DsonOptions::new().with_soft_line_length(20);
    let value = dson!(["alpha", "beta", "gamma", "delta", "epsilon", "zeta"]);
    let written = to_text_with_options(&value, &options).unwrap();
    assert!(written.lines().count() > 1);
    assert!(written.lines().skip(1).all(|line| line.starts_with("-| ")));
    assert_eq!(from_text(&written).unwrap(), value);
}

#[test]
fn test_quoted_string_continuations() {
    let value = from_text("-- \"ab\n-| cd\n-> ef\"").unwrap();
    assert_eq!(value, DsonValue::String("abcd\nef".into()));
    assert!(from_text("-- \"ab\n-- cd\"").is_err());
}

#[test]
fn test_line_buffer_hides_comments() {
    let mut buffer = LineBuffer::new("   \n# a\n\t# b\n-- z");
    assert_eq!(buffer.read().unwrap(), Scanned::Char('z'));
    assert_eq!(buffer.read().unwrap(), Scanned::Eof);
}

#[test]
fn test_binary_layout_of_typed_object() {
    let mut object = DsonObject::<FieldNumber>::new().with_class_id(ClassId::new(2, 7));
    object.insert(FieldNumber::of(1), DsonValue::Bool(true));
    object.insert(FieldNumber::new(1, 2), DsonValue::String("hi".into()));
    let bytes = to_binary(&DsonValue::Object(object.clone())).unwrap();
    assert_eq!(
        bytes,
        vec![
            104, 13, 0, 0, 0, // object tag, length
            1, 2, 7, 0, 0, 0, // class id 2:7
            33, 8, // true, field 0.1
            40, 17, 2, b'h', b'i', // string, field 1.2, "hi"
            120,
        ]
    );
    assert_eq!(from_binary(&bytes).unwrap(), DsonValue::Object(object));
}

#[test]
fn test_binary_wire_types() {
    let value = DsonValue::<FieldNumber>::Int32(-2);
    let encoded = |wire| {
        to_binary_with_options(&value, &DsonOptions::new().with_wire_type(wire)).unwrap()
    };
    assert_eq!(encoded(WireType::VarInt).len(), 11);
    assert_eq!(encoded(WireType::Uint), vec![1, 0xfe, 0xff, 0xff, 0xff, 0x0f]);
    assert_eq!(encoded(WireType::Sint), vec![2, 3]);
    assert_eq!(encoded(WireType::Fixed), vec![3, 0xfe, 0xff, 0xff, 0xff]);
    for wire in [WireType::VarInt, WireType::Uint, WireType::Sint, WireType::Fixed] {
        assert_eq!(from_binary(&encoded(wire)).unwrap(), value);
    }
}

#[test]
fn test_binary_corrupted_length() {
    let mut bytes = to_binary(&DsonValue::<FieldNumber>::Object(DsonObject::new())).unwrap();
    bytes[1] = 200;
    assert!(matches!(from_binary(&bytes), Err(dson::Error::Corrupted(_))));
}

#[test]
fn test_binary_writer_buffer_exhaustion() {
    let mut buf = [0u8; 3];
    let mut writer = BinaryWriter::new(&mut buf, &DsonOptions::default());
    let err = writer.write_start_object(None).unwrap_err();
    assert!(err.is_resource());
}
