//! Codec Tests
//!
//! Tests for the value codecs used for function arguments and results.

use atlasfn::{BincodeCodec, Codec, FunctionError, StringCodec, Value};

// =============================================================================
// String Codec
// =============================================================================

#[test]
fn test_string_codec_scalars() {
    let codec = StringCodec;

    assert_eq!(&codec.encode(&Value::from("hello")).unwrap()[..], b"hello");
    assert_eq!(&codec.encode(&Value::Int(-42)).unwrap()[..], b"-42");
    assert_eq!(&codec.encode(&Value::Float(1.5)).unwrap()[..], b"1.5");
    assert_eq!(&codec.encode(&Value::Bool(true)).unwrap()[..], b"true");
    assert_eq!(
        &codec.encode(&Value::Bytes(vec![0, 255, 1])).unwrap()[..],
        &[0, 255, 1]
    );
}

#[test]
fn test_string_codec_rejects_nil_and_lists() {
    let codec = StringCodec;

    for value in [Value::Nil, Value::List(vec![Value::Int(1)])] {
        let err = codec.encode(&value).unwrap_err();
        assert!(matches!(err, FunctionError::Encoding(_)), "got {:?}", err);
        assert!(err.to_string().contains(value.kind()));
    }
}

#[test]
fn test_string_codec_decode() {
    let codec = StringCodec;

    assert_eq!(codec.decode(b"text").unwrap(), Value::from("text"));
    assert_eq!(codec.decode(b"").unwrap(), Value::from(""));
    // Numbers stay text; the codec does not guess types
    assert_eq!(codec.decode(b"42").unwrap(), Value::from("42"));
    assert_eq!(
        codec.decode(b"\xff\x00").unwrap(),
        Value::Bytes(vec![0xff, 0x00])
    );
}

// =============================================================================
// Bincode Codec
// =============================================================================

#[test]
fn test_bincode_codec_preserves_structure() {
    let codec = BincodeCodec;
    let value = Value::List(vec![
        Value::Nil,
        Value::Bool(false),
        Value::Int(i64::MIN),
        Value::Float(-0.25),
        Value::from("unicode ✓"),
        Value::Bytes(vec![1, 2, 3]),
        Value::List(vec![Value::from("nested")]),
    ]);

    let encoded = codec.encode(&value).unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), value);
}

#[test]
fn test_bincode_codec_distinguishes_types() {
    let codec = BincodeCodec;

    let int = codec.encode(&Value::Int(1)).unwrap();
    let text = codec.encode(&Value::from("1")).unwrap();
    assert_ne!(int, text);
    assert_eq!(codec.decode(&int).unwrap().as_int(), Some(1));
    assert_eq!(codec.decode(&text).unwrap().as_str(), Some("1"));
}

#[test]
fn test_bincode_codec_rejects_garbage() {
    let err = BincodeCodec.decode(b"\xff\xff\xff\xff").unwrap_err();
    assert!(matches!(err, FunctionError::Decoding(_)), "got {:?}", err);

    let err = BincodeCodec.decode(b"").unwrap_err();
    assert!(matches!(err, FunctionError::Decoding(_)), "got {:?}", err);
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn test_value_conversions() {
    assert_eq!(Value::from("a"), Value::Str("a".to_string()));
    assert_eq!(Value::from(String::from("b")), Value::Str("b".to_string()));
    assert_eq!(Value::from(7i64), Value::Int(7));
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    assert_eq!(
        Value::from(vec![Value::Nil]),
        Value::List(vec![Value::Nil])
    );
    assert!(Value::Nil.is_nil());
    assert_eq!(Value::Int(3).as_str(), None);
}

#[test]
fn test_codecs_are_usable_as_trait_objects() {
    let codecs: Vec<Box<dyn Codec>> = vec![Box::new(StringCodec), Box::new(BincodeCodec)];
    let names: Vec<&str> = codecs.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["string", "bincode"]);

    for codec in &codecs {
        let encoded = codec.encode(&Value::from("same")).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), Value::from("same"));
    }
}
