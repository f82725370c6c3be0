//! The static mapping path: `BerEncode` and `BerDecode`.
//!
//! Every supported type carries its default Universal identifier and
//! knows how to drive the [`Encoder`] / [`Decoder`]. Composite std
//! types map onto constructed values: `Vec<T>` and arrays become
//! SEQUENCE, maps become SEQUENCE of alternating key and value, and
//! `Option<T>` bridges to NULL. Records get their implementations from
//! the `ber-derive` macros.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{BerError, BerResult};
use crate::ident::{decode_identifier, Ident, TagClass};
use crate::time::DateTime;

/// Types that can be written to an [`Encoder`].
pub trait BerEncode {
    /// The identifier used when the caller does not choose one.
    const IDENT: Ident;

    /// Append this value as one TLV; `id` overrides the default
    /// identifier unless it is [`Ident::EMPTY`].
    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()>;

    /// True when an `omitempty` field holding this value is skipped.
    fn is_empty_value(&self) -> bool {
        false
    }
}

/// Types that can be read back from a [`Decoder`].
pub trait BerDecode: Sized {
    /// The identifier used when the caller does not choose one.
    const IDENT: Ident;

    /// Decode one TLV into this type. `id` carries the identifier the
    /// caller expects; most types dispatch on the wire identifier and
    /// ignore it.
    fn decode_with(dec: &mut Decoder, id: Ident) -> BerResult<Self>;
}

impl BerEncode for () {
    const IDENT: Ident = Ident::NULL;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_null_with(id)
    }
}

impl BerDecode for () {
    const IDENT: Ident = Ident::NULL;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_null()
    }
}

impl BerEncode for bool {
    const IDENT: Ident = Ident::BOOL;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_bool_with(*self, id)
    }
}

impl BerDecode for bool {
    const IDENT: Ident = Ident::BOOL;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_bool()
    }
}

macro_rules! impl_ber_signed {
    ($($kind:ty),*) => {$(
        impl BerEncode for $kind {
            const IDENT: Ident = Ident::INTEGER;

            fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
                enc.encode_int_with(i64::from(*self), id)
            }
        }

        impl BerDecode for $kind {
            const IDENT: Ident = Ident::INTEGER;

            fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
                let val = dec.decode_int()?;
                <$kind>::try_from(val).map_err(|_| {
                    BerError::UnmarshalTarget(format!(
                        "{val}: does not fit {}", stringify!($kind)
                    ))
                })
            }
        }
    )*};
}

macro_rules! impl_ber_unsigned {
    ($($kind:ty),*) => {$(
        impl BerEncode for $kind {
            const IDENT: Ident = Ident::INTEGER;

            fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
                enc.encode_uint_with(u64::from(*self), id)
            }
        }

        impl BerDecode for $kind {
            const IDENT: Ident = Ident::INTEGER;

            fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
                let val = dec.decode_uint()?;
                <$kind>::try_from(val).map_err(|_| {
                    BerError::UnmarshalTarget(format!(
                        "{val}: does not fit {}", stringify!($kind)
                    ))
                })
            }
        }
    )*};
}

impl_ber_signed!(i8, i16, i32, i64);
impl_ber_unsigned!(u8, u16, u32, u64);

impl BerEncode for f64 {
    const IDENT: Ident = Ident::REAL;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_real_base2_with(*self, id)
    }
}

impl BerDecode for f64 {
    const IDENT: Ident = Ident::REAL;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_real()
    }
}

impl BerEncode for f32 {
    const IDENT: Ident = Ident::REAL;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_real_base2_with(f64::from(*self), id)
    }
}

impl BerDecode for f32 {
    const IDENT: Ident = Ident::REAL;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        Ok(dec.decode_real()? as f32)
    }
}

impl BerEncode for str {
    const IDENT: Ident = Ident::UTF8_STRING;

    /// Strings follow their identifier: under an ObjectIdentifier or
    /// Relative-OID tag the text is encoded as a dotted-decimal OID,
    /// under anything else as a character string.
    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::UTF8_STRING);
        if id.tag() == Ident::OBJECT_ID.tag() || id.tag() == Ident::REL_OBJECT_ID.tag() {
            enc.encode_oid_with(self, id)
        } else {
            enc.encode_string_with(self, id)
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl BerEncode for String {
    const IDENT: Ident = Ident::UTF8_STRING;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        self.as_str().encode_with(enc, id)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl BerDecode for String {
    const IDENT: Ident = Ident::UTF8_STRING;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        let wire = dec.peek()?;
        if wire.tag() == Ident::OBJECT_ID.tag() || wire.tag() == Ident::REL_OBJECT_ID.tag() {
            dec.decode_oid()
        } else {
            dec.decode_string()
        }
    }
}

impl BerEncode for DateTime {
    const IDENT: Ident = Ident::GENERALIZED_TIME;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_time_with(self, id)
    }
}

impl BerDecode for DateTime {
    const IDENT: Ident = Ident::GENERALIZED_TIME;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_time()
    }
}

/// An OCTET STRING. `Vec<u8>` encodes as a SEQUENCE of integers like
/// any other `Vec`; wrap the bytes in this type (or annotate the field
/// with `octetstr`) for string-of-octets semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OctetString(pub Vec<u8>);

impl OctetString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for OctetString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl BerEncode for OctetString {
    const IDENT: Ident = Ident::OCTET_STRING;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_bytes_with(&self.0, id)
    }

    fn is_empty_value(&self) -> bool {
        self.0.is_empty()
    }
}

impl BerDecode for OctetString {
    const IDENT: Ident = Ident::OCTET_STRING;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_bytes().map(OctetString)
    }
}

/// One complete, already encoded TLV. Encoding appends the bytes
/// verbatim; decoding captures the next TLV without interpreting it.
/// This is the escape hatch for foreign or not-yet-understood values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raw(pub Vec<u8>);

impl Raw {
    /// The identifier at the head of the stored TLV.
    pub fn peek(&self) -> BerResult<Ident> {
        decode_identifier(&self.0).map(|(id, _)| id)
    }
}

impl BerEncode for Raw {
    const IDENT: Ident = Ident::EMPTY;

    fn encode_with(&self, enc: &mut Encoder, _id: Ident) -> BerResult<()> {
        enc.encode_raw(&self.0)
    }

    fn is_empty_value(&self) -> bool {
        self.0.is_empty()
    }
}

impl BerDecode for Raw {
    const IDENT: Ident = Ident::EMPTY;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        dec.decode_raw()
    }
}

impl<T: BerEncode> BerEncode for [T] {
    const IDENT: Ident = Ident::SEQUENCE;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_child_with(id.or_default(Ident::SEQUENCE), |child| {
            for item in self {
                child.encode(item)?;
            }
            Ok(())
        })
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: BerEncode> BerEncode for Vec<T> {
    const IDENT: Ident = Ident::SEQUENCE;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        self.as_slice().encode_with(enc, id)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: BerDecode> BerDecode for Vec<T> {
    const IDENT: Ident = Ident::SEQUENCE;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        let (_, mut child) = dec.descend()?;
        let mut out = Vec::new();
        while !child.is_empty() {
            out.push(child.decode()?);
        }
        Ok(out)
    }
}

impl<T: BerEncode, const N: usize> BerEncode for [T; N] {
    const IDENT: Ident = Ident::SEQUENCE;

    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        self.as_slice().encode_with(enc, id)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }
}

impl<T: BerDecode + Default, const N: usize> BerDecode for [T; N] {
    const IDENT: Ident = Ident::SEQUENCE;

    /// Slots fill in order until the content is exhausted; any left
    /// over stay at their default.
    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        let (_, mut child) = dec.descend()?;
        let mut items = Vec::with_capacity(N);
        while items.len() < N && !child.is_empty() {
            items.push(child.decode()?);
        }
        items.resize_with(N, T::default);
        items
            .try_into()
            .map_err(|_| BerError::UnmarshalTarget("fixed array".into()))
    }
}

impl<K: BerEncode, V: BerEncode> BerEncode for HashMap<K, V> {
    const IDENT: Ident = Ident::SEQUENCE;

    /// Pairs are written key then value; the iteration order of the
    /// map is not specified.
    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        enc.encode_child_with(id.or_default(Ident::SEQUENCE), |child| {
            for (key, val) in self {
                child.encode(key)?;
                child.encode(val)?;
            }
            Ok(())
        })
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: BerDecode + Eq + Hash, V: BerDecode> BerDecode for HashMap<K, V> {
    const IDENT: Ident = Ident::SEQUENCE;

    fn decode_with(dec: &mut Decoder, _id: Ident) -> BerResult<Self> {
        let (_, mut child) = dec.descend()?;
        let mut out = HashMap::new();
        while !child.is_empty() {
            let key = child.decode()?;
            let val = child.decode()?;
            out.insert(key, val);
        }
        Ok(out)
    }
}

impl<T: BerEncode> BerEncode for Option<T> {
    const IDENT: Ident = T::IDENT;

    /// `None` encodes as NULL.
    fn encode_with(&self, enc: &mut Encoder, id: Ident) -> BerResult<()> {
        match self {
            Some(val) => val.encode_with(enc, id),
            None => enc.encode_null(),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: BerDecode> BerDecode for Option<T> {
    const IDENT: Ident = T::IDENT;

    /// A NULL on the wire, or nothing left in the enclosing value,
    /// decodes as `None`.
    fn decode_with(dec: &mut Decoder, id: Ident) -> BerResult<Self> {
        if dec.is_empty() {
            return Ok(None);
        }
        let wire = dec.peek()?;
        if wire.class() == TagClass::Universal
            && !wire.is_constructed()
            && wire.tag() == Ident::NULL.tag()
        {
            dec.decode_null()?;
            return Ok(None);
        }
        T::decode_with(dec, id).map(Some)
    }
}
