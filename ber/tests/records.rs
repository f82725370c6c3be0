//! Record mapping through the derive macros: encode a struct field by
//! field into a constructed value, decode it back.

use std::collections::HashMap;

use ber::{BerDecode, BerEncode, DateTime, Decoder, Encoder, Ident};
use ber_derive::{BerDecode, BerEncode};

fn encode<T: BerEncode>(val: &T) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.encode(val).unwrap();
    enc.into_bytes()
}

fn decode<T: BerDecode>(bytes: &[u8]) -> T {
    let mut dec = Decoder::new(bytes.to_vec());
    let got = dec.decode().unwrap();
    assert!(dec.is_empty());
    got
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct Sample {
    str: String,
    int: i64,
    float: f64,
    bool: bool,
    when: DateTime,
}

#[test]
fn record_wire_form() {
    let sample = Sample {
        str: "ber".into(),
        int: 127,
        float: 3.14,
        bool: true,
        when: DateTime::new(2019, 12, 15, 19, 2, 10).unwrap(),
    };
    let want = [
        0x30, 0x2b, //
        0x0c, 0x03, b'b', b'e', b'r', //
        0x02, 0x01, 0x7f, //
        0x09, 0x09, 0x80, 0xcd, 0x19, 0x1e, 0xb8, 0x51, 0xeb, 0x85, 0x1f, //
        0x01, 0x01, 0xff, //
        0x18, 0x13, 0x32, 0x30, 0x31, 0x39, 0x31, 0x32, 0x31, 0x35, 0x31, 0x39, 0x30, 0x32,
        0x31, 0x30, 0x2b, 0x30, 0x30, 0x30, 0x30,
    ];
    assert_eq!(encode(&sample), want);
}

#[test]
fn record_round_trip() {
    let sample = Sample {
        str: "ber".into(),
        int: 127,
        float: 3.14,
        bool: true,
        when: DateTime::new(2019, 12, 15, 19, 2, 10).unwrap(),
    };
    let bytes = encode(&sample);
    assert_eq!(decode::<Sample>(&bytes), sample);
    // the encoder is deterministic over its own output
    assert_eq!(encode(&decode::<Sample>(&bytes)), bytes);
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct Annotated {
    int: i8,
    #[ber("class:0x3")]
    uint: u8,
    #[ber("printable,type:0x1")]
    text: String,
    #[ber("oid")]
    oid: String,
    #[ber("generalized")]
    when: DateTime,
    #[ber("set")]
    pairs: HashMap<String, i64>,
    #[ber("set,omitempty")]
    extra: Vec<i64>,
    flag: bool,
    note: Option<i64>,
}

fn annotated() -> Annotated {
    Annotated {
        int: -128,
        uint: 127,
        text: "foobar".into(),
        oid: "1.2.840.113549.1.1.11".into(),
        when: DateTime::new(2019, 12, 15, 19, 2, 10).unwrap(),
        pairs: HashMap::from([(String::from("foo"), 128i64)]),
        extra: Vec::new(),
        flag: false,
        note: None,
    }
}

#[test]
fn annotations_steer_the_wire_form() {
    let want = [
        0x30, 0x3e, //
        0x02, 0x01, 0x80, // int, plain INTEGER
        0xc2, 0x01, 0x7f, // uint, class Private
        0x33, 0x06, b'f', b'o', b'o', b'b', b'a', b'r', // constructed PrintableString
        0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b, // oid
        0x18, 0x13, 0x32, 0x30, 0x31, 0x39, 0x31, 0x32, 0x31, 0x35, 0x31, 0x39, 0x30, 0x32,
        0x31, 0x30, 0x2b, 0x30, 0x30, 0x30, 0x30, // generalized time
        0x31, 0x09, 0x0c, 0x03, b'f', b'o', b'o', 0x02, 0x02, 0x00, 0x80, // map as SET
        // empty `extra` omitted
        0x01, 0x01, 0x00, // flag
        0x05, 0x00, // note, None as NULL
    ];
    assert_eq!(encode(&annotated()), want);
}

#[test]
fn annotated_round_trip() {
    // an omitted field cannot be read back by the in-order field walk,
    // so the round trip runs with `extra` populated
    let mut val = annotated();
    val.extra = vec![1, 2];
    val.note = Some(-7);
    assert_eq!(decode::<Annotated>(&encode(&val)), val);
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct Tagged {
    id: Ident,
    val: i64,
}

#[test]
fn ident_field_supplies_outer_identifier() {
    let tagged = Tagged {
        id: Ident::constructed(3).application(),
        val: 127,
    };
    let bytes = encode(&tagged);
    assert_eq!(bytes, [0x63, 0x03, 0x02, 0x01, 0x7f]);
    assert_eq!(decode::<Tagged>(&bytes), tagged);
}

#[test]
fn empty_ident_field_falls_back_to_sequence() {
    let tagged = Tagged {
        id: Ident::EMPTY,
        val: 127,
    };
    let bytes = encode(&tagged);
    assert_eq!(bytes, [0x30, 0x03, 0x02, 0x01, 0x7f]);
    let got = decode::<Tagged>(&bytes);
    // decoding always records the identifier it actually read
    assert_eq!(got.id, Ident::SEQUENCE);
    assert_eq!(got.val, 127);
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct Inner {
    count: u32,
    label: String,
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct Outer {
    name: String,
    #[ber("tag:0,class:2,type:1")]
    inner: Inner,
    trailer: Option<String>,
}

#[test]
fn nested_records() {
    let outer = Outer {
        name: "outer".into(),
        inner: Inner {
            count: 9,
            label: "inner".into(),
        },
        trailer: Some("end".into()),
    };
    let bytes = encode(&outer);
    // the inner record sits under context tag [0]
    assert_eq!(bytes[9], 0xa0);
    assert_eq!(decode::<Outer>(&bytes), outer);
}

#[test]
fn missing_trailing_option_decodes_to_none() {
    let mut enc = Encoder::new();
    enc.encode_utf8("outer").unwrap();
    enc.encode_child_with(Ident::constructed(0).context(), |child| {
        child.encode_uint(9)?;
        child.encode_utf8("inner")
    })
    .unwrap();
    let got: Outer = decode(&enc.as_sequence().unwrap());
    assert_eq!(got.trailer, None);
}

#[derive(Debug, PartialEq, BerEncode, BerDecode)]
struct WithSkips {
    kept: i64,
    #[ber("-")]
    scratch: String,
}

#[test]
fn skipped_fields_never_touch_the_wire() {
    let val = WithSkips {
        kept: 1,
        scratch: "local only".into(),
    };
    let bytes = encode(&val);
    assert_eq!(bytes, [0x30, 0x03, 0x02, 0x01, 0x01]);
    let got = decode::<WithSkips>(&bytes);
    assert_eq!(got.kept, 1);
    assert_eq!(got.scratch, "");
}

#[test]
fn records_nest_in_containers() {
    let list = vec![
        Inner {
            count: 1,
            label: "a".into(),
        },
        Inner {
            count: 2,
            label: "b".into(),
        },
    ];
    assert_eq!(decode::<Vec<Inner>>(&encode(&list)), list);
}

#[test]
fn truncated_record_over_consumes() {
    // SEQUENCE containing only the first field of Sample
    let mut enc = Encoder::new();
    enc.encode_utf8("ber").unwrap();
    let bytes = enc.as_sequence().unwrap();
    let mut dec = Decoder::new(bytes);
    assert!(matches!(
        dec.decode::<Sample>(),
        Err(ber::BerError::OverConsume)
    ));
}
