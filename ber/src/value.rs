//! A dynamic, self-describing BER value.
//!
//! [`Value`] is the tag-driven counterpart of the static traits: it
//! decodes input whose shape is not known at compile time, keeping
//! whatever the wire says. Universal tags map onto dedicated variants;
//! Application, Context and Private tags land in [`Value::Implicit`]
//! (primitive, raw content kept) or [`Value::Explicit`] (constructed,
//! children decoded).

use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{BerError, BerResult};
use crate::ident::{Ident, TagClass};
use crate::time::DateTime;
use crate::traits::{BerDecode, BerEncode};

/// Container holding any decodable BER value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// INTEGER, read with sign extension
    Int(i64),
    /// ENUMERATED
    Enumerated(i64),
    /// REAL
    Real(f64),
    /// OCTET STRING
    OctetString(Vec<u8>),
    /// UTF8String
    Utf8String(String),
    /// PrintableString
    PrintableString(String),
    /// IA5String
    Ia5String(String),
    /// OBJECT IDENTIFIER in dotted-decimal text
    ObjectId(String),
    /// Relative OID with a leading dot
    RelObjectId(String),
    /// UTCTime, normalized to UTC
    UtcTime(DateTime),
    /// GeneralizedTime, normalized to UTC
    GeneralizedTime(DateTime),
    /// SEQUENCE / SEQUENCE OF
    Sequence(Vec<Value>),
    /// SET / SET OF
    Set(Vec<Value>),
    /// A primitive value of a non-universal class, content kept raw
    Implicit(Ident, Vec<u8>),
    /// A constructed value of a non-universal class, children decoded
    Explicit(Ident, Vec<Value>),
}

impl Value {
    /// The identifier this value encodes under by default.
    pub fn ident(&self) -> Ident {
        match self {
            Value::Null => Ident::NULL,
            Value::Bool(_) => Ident::BOOL,
            Value::Int(_) => Ident::INTEGER,
            Value::Enumerated(_) => Ident::ENUMERATED,
            Value::Real(_) => Ident::REAL,
            Value::OctetString(_) => Ident::OCTET_STRING,
            Value::Utf8String(_) => Ident::UTF8_STRING,
            Value::PrintableString(_) => Ident::PRINTABLE_STRING,
            Value::Ia5String(_) => Ident::IA5_STRING,
            Value::ObjectId(_) => Ident::OBJECT_ID,
            Value::RelObjectId(_) => Ident::REL_OBJECT_ID,
            Value::UtcTime(_) => Ident::UTC_TIME,
            Value::GeneralizedTime(_) => Ident::GENERALIZED_TIME,
            Value::Sequence(_) => Ident::SEQUENCE,
            Value::Set(_) => Ident::SET,
            Value::Implicit(id, _) | Value::Explicit(id, _) => *id,
        }
    }
}

impl BerEncode for Value {
    const IDENT: Ident = Ident::EMPTY;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        let id = id.or_default(self.ident());
        match self {
            Value::Null => enc.encode_null_with(id),
            Value::Bool(val) => enc.encode_bool_with(*val, id),
            Value::Int(val) => enc.encode_int_with(*val, id),
            Value::Enumerated(val) => enc.encode_enumerated_with(*val, id),
            Value::Real(val) => enc.encode_real_base2_with(*val, id),
            Value::OctetString(bytes) => enc.encode_bytes_with(bytes, id),
            Value::Utf8String(text)
            | Value::PrintableString(text)
            | Value::Ia5String(text) => enc.encode_string_with(text, id),
            Value::ObjectId(text) | Value::RelObjectId(text) => enc.encode_oid_with(text, id),
            Value::UtcTime(at) | Value::GeneralizedTime(at) => enc.encode_time_with(at, id),
            Value::Sequence(items) | Value::Set(items) | Value::Explicit(_, items) => enc
                .encode_child_with(id, |child| {
                    for item in items {
                        child.encode(item)?;
                    }
                    Ok(())
                }),
            Value::Implicit(_, bytes) => enc.encode_bytes_with(bytes, id),
        }
    }

    fn is_empty_value(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl BerDecode for Value {
    const IDENT: Ident = Ident::EMPTY;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        let wire = dec.peek()?;
        if wire.class() != TagClass::Universal {
            log::trace!(
                "decoding class {:?} tag {} as a raw value",
                wire.class(),
                wire.tag()
            );
            return if wire.is_constructed() {
                let (id, mut child) = dec.descend()?;
                Ok(Value::Explicit(id, decode_items(&mut child)?))
            } else {
                Ok(Value::Implicit(wire, dec.decode_bytes()?))
            };
        }
        match wire.tag() {
            tag if tag == Ident::NULL.tag() => dec.decode_null().map(|_| Value::Null),
            tag if tag == Ident::BOOL.tag() => dec.decode_bool().map(Value::Bool),
            tag if tag == Ident::INTEGER.tag() => dec.decode_int().map(Value::Int),
            tag if tag == Ident::ENUMERATED.tag() => {
                dec.decode_enumerated().map(Value::Enumerated)
            }
            tag if tag == Ident::REAL.tag() => dec.decode_real().map(Value::Real),
            tag if tag == Ident::OCTET_STRING.tag() => {
                dec.decode_bytes().map(Value::OctetString)
            }
            tag if tag == Ident::UTF8_STRING.tag() => dec.decode_string().map(Value::Utf8String),
            tag if tag == Ident::PRINTABLE_STRING.tag() => {
                dec.decode_string().map(Value::PrintableString)
            }
            tag if tag == Ident::IA5_STRING.tag() => dec.decode_string().map(Value::Ia5String),
            tag if tag == Ident::OBJECT_ID.tag() => dec.decode_oid().map(Value::ObjectId),
            tag if tag == Ident::REL_OBJECT_ID.tag() => dec.decode_oid().map(Value::RelObjectId),
            tag if tag == Ident::UTC_TIME.tag() => dec.decode_time().map(Value::UtcTime),
            tag if tag == Ident::GENERALIZED_TIME.tag() => {
                dec.decode_time().map(Value::GeneralizedTime)
            }
            tag if tag == Ident::SEQUENCE.tag() => {
                let (_, mut child) = dec.descend()?;
                Ok(Value::Sequence(decode_items(&mut child)?))
            }
            tag if tag == Ident::SET.tag() => {
                let (_, mut child) = dec.descend()?;
                Ok(Value::Set(decode_items(&mut child)?))
            }
            tag => Err(BerError::UnmarshalTarget(format!(
                "universal tag {tag} has no value shape"
            ))),
        }
    }
}

fn decode_items(child: &mut Decoder) -> BerResult<Vec<Value>> {
    let mut items = Vec::new();
    while !child.is_empty() {
        items.push(child.decode()?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(val: &Value) -> Value {
        let mut enc = Encoder::new();
        enc.encode(val).unwrap();
        let mut dec = Decoder::new(enc.into_bytes());
        let got = dec.decode().unwrap();
        assert!(dec.is_empty());
        got
    }

    #[test]
    fn universal_values() {
        for val in [
            Value::Null,
            Value::Bool(true),
            Value::Int(-512456),
            Value::Enumerated(3),
            Value::Real(0.625),
            Value::OctetString(vec![0xde, 0xad, 0xbe, 0xef]),
            Value::Utf8String("foobar".into()),
            Value::PrintableString("foo bar".into()),
            Value::Ia5String("foo@bar".into()),
            Value::ObjectId("1.2.840.113549.1.1.11".into()),
            Value::RelObjectId(".8571.3.2".into()),
            Value::UtcTime(DateTime::new(2019, 12, 15, 19, 2, 10).unwrap()),
            Value::GeneralizedTime(DateTime::new(2019, 12, 15, 19, 2, 10).unwrap()),
        ] {
            assert_eq!(round_trip(&val), val);
        }
    }

    #[test]
    fn nested_containers() {
        let val = Value::Sequence(vec![
            Value::Int(1),
            Value::Set(vec![Value::Bool(false), Value::Null]),
            Value::Utf8String("x".into()),
        ]);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn non_universal_tags_kept_raw() {
        let implicit = Value::Implicit(
            Ident::primitive(0).context(),
            vec![0x01, 0x02, 0x03],
        );
        let got = round_trip(&implicit);
        assert_eq!(got, implicit);

        let explicit = Value::Explicit(
            Ident::constructed(5).application(),
            vec![Value::Int(7), Value::Null],
        );
        let got = round_trip(&explicit);
        assert_eq!(got, explicit);
    }

    #[test]
    fn decodes_encoder_output() {
        let mut enc = Encoder::new();
        enc.encode_bool(true).unwrap();
        enc.encode_int(127).unwrap();
        let mut dec = Decoder::new(enc.as_sequence().unwrap());

        let got: Value = dec.decode().unwrap();
        assert_eq!(
            got,
            Value::Sequence(vec![Value::Bool(true), Value::Int(127)])
        );
    }

    #[test]
    fn unsupported_universal_shape() {
        // BIT STRING has no Value variant
        let mut dec = Decoder::new(vec![0x03, 0x02, 0x00, 0xff]);
        assert!(matches!(
            dec.decode::<Value>(),
            Err(BerError::UnmarshalTarget(_))
        ));
    }
}
