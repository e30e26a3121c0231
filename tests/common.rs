use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use unspool::{Decoder, Error, ErrorValue, TypeTag, Value};


use script::{Script, Tok};

#[test]
fn decode_map_with_handshake() {
    let mut parser = Script::new([
        Tok::Map(Some(2)),
        Tok::Str("a"),
        Tok::Value,
        Tok::Int(5),
        Tok::Next,
        Tok::Str("b"),
        Tok::Value,
        Tok::Int(7),
        Tok::Close,
    ]);

    let map: HashMap<String, i64> = unspool::decode(&mut parser).unwrap();

    assert_eq!(map, HashMap::from([("a".to_string(), 5), ("b".to_string(), 7)]));
    assert_eq!(parser.remaining(), 0);
    assert_eq!(
        parser.calls,
        [
            "type",
            "map_begin",
            "type",
            "string",
            "map_value(0)",
            "type",
            "int",
            "map_next(1)",
            "type",
            "string",
            "map_value(1)",
            "type",
            "int",
            "map_end(2)",
        ]
    );
}

#[test]
fn decode_streamed_array() {
    let mut parser = Script::new([
        Tok::Array(None),
        Tok::Next,
        Tok::Int(1),
        Tok::Next,
        Tok::Int(2),
        Tok::End,
        Tok::Close,
    ]);

    let items: Vec<i64> = unspool::decode(&mut parser).unwrap();

    assert_eq!(items, [1, 2]);
    assert_eq!(parser.remaining(), 0);
    assert_eq!(parser.count("array_end(2)"), 1);
}

#[test]
fn decode_known_length_array() {
    let mut parser = Script::new([
        Tok::Array(Some(3)),
        Tok::Uint(1),
        Tok::Next,
        Tok::Int(2),
        Tok::Next,
        Tok::Uint(3),
        Tok::Close,
    ]);

    let items: Vec<u16> = unspool::decode(&mut parser).unwrap();

    assert_eq!(items, [1, 2, 3]);
    assert_eq!(parser.count("array_next(0)"), 0);
    assert_eq!(parser.count("array_end(3)"), 1);
}

#[test]
fn decode_signed_bounds() {
    let mut parser = Script::new([Tok::Int(300)]);
    let mut value: i8 = 12;
    let err = Decoder::new(&mut parser).decode(&mut value).unwrap_err();

    assert!(matches!(err, Error::OutOfRange { value: 300, target: "i8" }));
    assert_eq!(value, 12);

    let mut parser = Script::new([Tok::Int(100)]);
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(value, 100);
}

#[test]
fn decode_unsigned_rejects_negative() {
    let mut parser = Script::new([Tok::Int(-1)]);
    let err = unspool::decode::<u32>(&mut parser).unwrap_err();

    assert!(matches!(err, Error::OutOfRange { value: -1, target: "u32" }));
}

#[test]
fn decode_signed_from_uint() {
    let mut parser = Script::new([Tok::Uint(u64::MAX)]);
    let err = unspool::decode::<i64>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));

    let mut parser = Script::new([Tok::Uint(7)]);
    assert_eq!(unspool::decode::<i64>(&mut parser).unwrap(), 7);
}

#[test]
fn decode_float_widens_integers() {
    let mut parser = Script::new([Tok::Int(-3)]);
    assert_eq!(unspool::decode::<f64>(&mut parser).unwrap(), -3.0);

    let mut parser = Script::new([Tok::Uint(u64::MAX)]);
    assert_eq!(unspool::decode::<f32>(&mut parser).unwrap(), u64::MAX as f32);

    let mut parser = Script::new([Tok::Float(1.5)]);
    assert_eq!(unspool::decode::<f32>(&mut parser).unwrap(), 1.5);
}

#[test]
fn decode_type_conversion() {
    let mut parser = Script::new([Tok::Str("yes")]);
    let mut value = true;
    let err = Decoder::new(&mut parser).decode(&mut value).unwrap_err();

    assert!(matches!(
        err,
        Error::TypeConversion {
            found: TypeTag::String,
            expected: TypeTag::Bool,
        }
    ));
    assert!(value);

    let mut parser = Script::new([Tok::Bool(true)]);
    let err = unspool::decode::<i32>(&mut parser).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeConversion {
            found: TypeTag::Bool,
            expected: TypeTag::Int,
        }
    ));
}

#[test]
fn decode_nil_resets_leaves() {
    let mut parser = Script::new([Tok::Nil]);
    let mut value = String::from("kept");
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(value, "");

    let mut parser = Script::new([Tok::Nil]);
    let mut value = 42u8;
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(value, 0);
}

#[test]
fn decode_nil_resets_containers() {
    let mut parser = Script::new([Tok::Nil]);
    let mut items = vec![1, 2, 3];
    Decoder::new(&mut parser).decode(&mut items).unwrap();
    assert!(items.is_empty());

    let mut parser = Script::new([Tok::Nil]);
    let mut map = HashMap::from([("a".to_string(), Value::Int(1))]);
    Decoder::new(&mut parser).decode(&mut map).unwrap();
    assert!(map.is_empty());

    let mut parser = Script::new([Tok::Nil]);
    let mut map = BTreeMap::from([(1u8, 2u8)]);
    Decoder::new(&mut parser).decode(&mut map).unwrap();
    assert!(map.is_empty());

    let mut parser = Script::new([Tok::Nil]);
    let mut array = [4u8, 5, 6];
    Decoder::new(&mut parser).decode(&mut array).unwrap();
    assert_eq!(array, [0, 0, 0]);

    let mut parser = Script::new([Tok::Nil]);
    let mut value = Some(Box::new(3i32));
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(value, None);
}

#[test]
fn decode_option_allocates() {
    let mut parser = Script::new([Tok::Int(9)]);
    let value: Option<i64> = unspool::decode(&mut parser).unwrap();
    assert_eq!(value, Some(9));

    let mut parser = Script::new([Tok::Int(10)]);
    let mut value = Some(1i64);
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(value, Some(10));
}

#[test]
fn decode_boxed_value() {
    let mut parser = Script::new([Tok::Str("boxed")]);
    let mut value = Box::new(String::new());
    Decoder::new(&mut parser).decode(&mut value).unwrap();
    assert_eq!(*value, "boxed");

    let mut parser = Script::new([Tok::Array(Some(1)), Tok::Uint(7), Tok::Close]);
    let values: Vec<Box<u8>> = unspool::decode(&mut parser).unwrap();
    assert_eq!(values, [Box::new(7)]);
}

#[test]
fn decode_fixed_array_length_mismatch() {
    let mut parser = Script::new([
        Tok::Array(Some(3)),
        Tok::Int(1),
        Tok::Next,
        Tok::Int(2),
        Tok::Next,
        Tok::RawStr(b"\xff"),
        Tok::Close,
    ]);

    let mut array = [0i32; 2];
    let err = Decoder::new(&mut parser).decode(&mut array).unwrap_err();

    assert!(matches!(err, Error::LengthMismatch { expected: 2, found: 3 }));
    assert_eq!(array, [1, 2]);
    assert_eq!(parser.remaining(), 0);

    let mut parser = Script::new([Tok::Array(Some(1)), Tok::Int(1), Tok::Close]);
    let err = unspool::decode::<[i32; 2]>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 2, found: 1 }));
}

#[test]
fn decode_text_and_bytes() {
    let mut parser = Script::new([Tok::Bytes(b"hello")]);
    assert_eq!(unspool::decode::<String>(&mut parser).unwrap(), "hello");

    let mut parser = Script::new([Tok::Str("raw")]);
    assert_eq!(unspool::decode::<Vec<u8>>(&mut parser).unwrap(), b"raw");

    let mut parser = Script::new([Tok::Bytes(&[0, 1, 2])]);
    assert_eq!(unspool::decode::<Bytes>(&mut parser).unwrap(), Bytes::from_static(&[0, 1, 2]));

    let mut parser = Script::new([Tok::Bytes(&[0xff, 0xfe])]);
    let err = unspool::decode::<String>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::Utf8(_)));

    let mut parser = Script::new([Tok::Int(1)]);
    let err = unspool::decode::<Vec<u8>>(&mut parser).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeConversion {
            found: TypeTag::Int,
            expected: TypeTag::Bytes,
        }
    ));
}

#[test]
fn decode_time_and_duration() {
    let mut parser = Script::new([Tok::Str("2024-03-01T12:30:00.123456789Z")]);
    let time: DateTime<Utc> = unspool::decode(&mut parser).unwrap();
    assert_eq!(time.timestamp_subsec_nanos(), 123_456_789);
    assert_eq!(time.to_rfc3339(), "2024-03-01T12:30:00.123456789+00:00");

    let mut parser = Script::new([Tok::Time(DateTime::UNIX_EPOCH)]);
    assert_eq!(unspool::decode::<DateTime<Utc>>(&mut parser).unwrap(), DateTime::UNIX_EPOCH);

    let mut parser = Script::new([Tok::Str("yesterday")]);
    let err = unspool::decode::<DateTime<Utc>>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::Timestamp(_)));

    let mut parser = Script::new([Tok::Str("1h30m")]);
    let delta: TimeDelta = unspool::decode(&mut parser).unwrap();
    assert_eq!(delta, TimeDelta::minutes(90));

    let mut parser = Script::new([Tok::Duration(TimeDelta::seconds(-4))]);
    assert_eq!(unspool::decode::<TimeDelta>(&mut parser).unwrap(), TimeDelta::seconds(-4));
}

#[test]
fn decode_durations() {
    let cases = [
        ("0", TimeDelta::zero()),
        ("5s", TimeDelta::seconds(5)),
        ("+5s", TimeDelta::seconds(5)),
        ("-5s", TimeDelta::seconds(-5)),
        ("1.5s", TimeDelta::milliseconds(1500)),
        (".5s", TimeDelta::milliseconds(500)),
        ("1.s", TimeDelta::seconds(1)),
        ("300ms", TimeDelta::milliseconds(300)),
        ("10us", TimeDelta::microseconds(10)),
        ("10µs", TimeDelta::microseconds(10)),
        ("7ns", TimeDelta::nanoseconds(7)),
        ("2h45m30.5s", TimeDelta::milliseconds(9_930_500)),
        ("-9223372036854775808ns", TimeDelta::nanoseconds(i64::MIN)),
        ("9223372036854775807ns", TimeDelta::nanoseconds(i64::MAX)),
    ];

    for (text, expected) in cases {
        let mut parser = Script::new([Tok::Str(text)]);
        assert_eq!(unspool::decode::<TimeDelta>(&mut parser).unwrap(), expected, "{text}");
    }

    for text in ["", "-", "s", "5", "5x", ".s", "1..2s", "9223372036854775808ns", "3000000h"] {
        let mut parser = Script::new([Tok::Str(text)]);
        let err = unspool::decode::<TimeDelta>(&mut parser).unwrap_err();
        assert!(matches!(err, Error::Duration { .. }), "{text}");
    }
}

#[test]
fn decode_error_values() {
    let mut parser = Script::new([Tok::Error("boom")]);
    assert_eq!(unspool::decode::<ErrorValue>(&mut parser).unwrap(), ErrorValue::new("boom"));

    let mut parser = Script::new([Tok::Str("wrapped")]);
    let err = unspool::decode::<ErrorValue>(&mut parser).unwrap();
    assert_eq!(err.to_string(), "wrapped");

    let mut parser = Script::new([Tok::Int(1)]);
    let err = unspool::decode::<ErrorValue>(&mut parser).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeConversion {
            found: TypeTag::Int,
            expected: TypeTag::Error,
        }
    ));
}

#[test]
fn decode_dynamic_values() {
    let mut tokens = vec![Tok::Array(Some(3)), Tok::Uint(1), Tok::Next, Tok::Nil, Tok::Next];
    tokens.extend(script::map(&[("k", Tok::Str("v")), ("f", Tok::Float(0.5))]));
    tokens.push(Tok::Close);

    let mut parser = Script::new(tokens);
    let value: Value = unspool::decode(&mut parser).unwrap();

    assert_eq!(
        value,
        Value::Array(vec![
            Value::Uint(1),
            Value::Nil,
            Value::Map(vec![
                (Value::from("k"), Value::from("v")),
                (Value::from("f"), Value::Float(0.5)),
            ]),
        ])
    );
    assert_eq!(parser.remaining(), 0);
}

#[test]
fn decode_string_keyed_maps_in_place() {
    let mut parser = Script::new(script::map(&[("x", Tok::Str("1")), ("y", Tok::Bytes(b"2"))]));
    let mut map = HashMap::from([("stale".to_string(), "gone".to_string())]);
    Decoder::new(&mut parser).decode(&mut map).unwrap();

    assert_eq!(
        map,
        HashMap::from([("x".to_string(), "1".to_string()), ("y".to_string(), "2".to_string())])
    );

    let mut parser = Script::new(script::map(&[("n", Tok::Int(-1)), ("b", Tok::Bool(false))]));
    let map: HashMap<String, Value> = unspool::decode(&mut parser).unwrap();

    assert_eq!(map["n"], Value::Int(-1));
    assert_eq!(map["b"], Value::Bool(false));
}

#[test]
fn decode_map_override() {
    let mut parser = Script::new(script::map(&[("a", Tok::Int(1)), ("b", Tok::Int(2))]));
    let mut value = Value::Nil;

    Decoder::new(&mut parser)
        .with_map_decoder(|mut pair, entries| {
            let mut key = String::new();
            let mut value = 0i64;
            pair.key().decode(&mut key)?;
            pair.value().decode(&mut value)?;
            entries.push((Value::from(key.to_uppercase()), Value::from(value * 10)));
            Ok(())
        })
        .decode(&mut value)
        .unwrap();

    assert_eq!(value.get("A"), Some(&Value::Int(10)));
    assert_eq!(value.get("B"), Some(&Value::Int(20)));
    assert_eq!(parser.count("map_value(0)"), 1);
    assert_eq!(parser.count("map_value(1)"), 1);
}

#[test]
fn decode_array_callback() {
    let mut parser = Script::new([Tok::Array(None), Tok::Next, Tok::Int(4), Tok::End, Tok::Close]);
    let mut sum = 0i64;

    let tag = Decoder::new(&mut parser)
        .decode_array(|d| {
            let mut item = 0i64;
            d.decode(&mut item)?;
            sum += item;
            Ok(())
        })
        .unwrap();

    assert_eq!(tag, TypeTag::Array);
    assert_eq!(sum, 4);
}

#[test]
fn decode_map_callback_handshake_before_value() {
    let mut parser = Script::new(script::map(&[("a", Tok::Int(1)), ("b", Tok::Int(2)), ("c", Tok::Int(3))]));
    let mut seen = Vec::new();

    let tag = Decoder::new(&mut parser)
        .decode_map(|mut pair| {
            let mut key = String::new();
            let mut value = 0u8;
            pair.key().decode(&mut key)?;
            pair.value().decode(&mut value)?;
            seen.push((pair.index(), key, value));
            Ok(())
        })
        .unwrap();

    assert_eq!(tag, TypeTag::Map);
    assert_eq!(
        seen,
        [(0, "a".to_string(), 1), (1, "b".to_string(), 2), (2, "c".to_string(), 3)]
    );

    for i in 0..3 {
        let call = format!("map_value({i})");
        assert_eq!(parser.count(&call), 1);

        let at = parser.calls.iter().position(|c| *c == call).unwrap();
        assert_eq!(parser.calls[at + 1], "type");
        assert_eq!(parser.calls[at + 2], "int");
    }
}

#[test]
fn decode_nested_handshake_through_value_decoder() {
    let mut parser = Script::new([
        Tok::Map(Some(1)),
        Tok::Str("list"),
        Tok::Value,
        Tok::Array(Some(1)),
        Tok::Int(8),
        Tok::Close,
        Tok::Close,
    ]);
    let mut items = Vec::new();

    Decoder::new(&mut parser)
        .decode_map(|mut pair| {
            pair.key().decode(&mut String::new())?;
            pair.value().decode_array(|d| {
                let mut item = 0i64;
                d.decode(&mut item)?;
                items.push(item);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    assert_eq!(items, [8]);
    assert_eq!(parser.count("map_value(0)"), 1);
}

#[test]
fn decode_truncated_stream() {
    let mut parser = Script::new([Tok::Array(Some(2)), Tok::Int(1), Tok::Next]);
    let err = unspool::decode::<Vec<i64>>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::Truncated));

    let mut parser = Script::new([]);
    let err = unspool::decode::<bool>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::Truncated));
}

#[test]
fn decode_propagates_parser_errors() {
    let mut parser = Script::new([Tok::Array(Some(2)), Tok::Int(1), Tok::Next, Tok::Fail("lost connection")]);
    let err = unspool::decode::<Vec<i64>>(&mut parser).unwrap_err();

    assert!(matches!(err, Error::Parser(_)));
    assert_eq!(err.to_string(), "lost connection");
}

#[test]
fn decode_unsupported_destination() {
    let mut parser = Script::new([Tok::Int(1)]);
    let err = unspool::decode::<std::marker::PhantomData<u8>>(&mut parser).unwrap_err();

    assert!(matches!(err, Error::Unsupported { .. }));
    assert_eq!(parser.remaining(), 1);
}

#[test]
fn decode_dynamic_invalid_text_as_bytes() {
    let mut parser = Script::new([Tok::Array(Some(2)), Tok::RawStr(b"\xff\xfe"), Tok::Next, Tok::Str("ok"), Tok::Close]);
    let value: Value = unspool::decode(&mut parser).unwrap();

    assert_eq!(
        value,
        Value::Array(vec![Value::Bytes(vec![0xff, 0xfe]), Value::from("ok")])
    );

    let mut parser = Script::new([Tok::RawStr(b"\xff")]);
    let err = unspool::decode::<String>(&mut parser).unwrap_err();
    assert!(matches!(err, Error::Utf8(_)));
}

#[test]
fn decode_callbacks_report_truncation() {
    let mut parser = Script::new([]);
    let err = Decoder::new(&mut parser).decode_array(|_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::Truncated));

    let mut parser = Script::new([]);
    let err = Decoder::new(&mut parser).decode_map(|_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::Truncated));

    let mut parser = Script::new([Tok::Map(Some(2)), Tok::Str("a"), Tok::Value, Tok::Int(1), Tok::Next]);
    let err = Decoder::new(&mut parser)
        .decode_map(|mut pair| {
            let mut key = String::new();
            pair.key().decode(&mut key)?;
            let mut value = 0i64;
            pair.value().decode(&mut value)
        })
        .unwrap_err();
    assert!(matches!(err, Error::Truncated));
}
