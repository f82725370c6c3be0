//! BER encoder: typed operations appending TLV triplets to a buffer.

use crate::error::{BerError, BerResult};
use crate::ident::{encode_identifier, Ident};
use crate::int::{encode_int, encode_uint};
use crate::length::encode_length;
use crate::oid::{encode_oid, encode_rel_oid};
use crate::real::{encode_binary, encode_decimal, encode_special};
use crate::text::{valid_ia5_string, valid_printable_string};
use crate::time::{format_generalized, format_utc, DateTime};
use crate::traits::BerEncode;

/// BER encoder over an append-only buffer.
///
/// Every encode operation appends one complete TLV, so after any run of
/// successful calls the buffer is a concatenation of well-formed BER
/// values. A failed operation appends nothing. The `as_*` finalizers
/// wrap the accumulated buffer under a constructed header without
/// consuming the encoder.
///
/// Operations come in pairs: `encode_bool(v)` uses the type's Universal
/// identifier, `encode_bool_with(v, id)` a caller-supplied one.
/// Passing `Ident::EMPTY` to a `*_with` operation selects the default.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create a new, empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with pre-allocated buffer space.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// The accumulated TLVs.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the encoder, returning the accumulated TLVs.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything encoded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append one TLV. The header is assembled before anything is
    /// written, so a failure leaves the buffer untouched.
    fn push_tlv(&mut self, content: &[u8], id: Ident) -> BerResult<()> {
        let mut header = Vec::with_capacity(12);
        encode_identifier(id, &mut header);
        encode_length(content.len(), &mut header)?;
        self.buf.extend_from_slice(&header);
        self.buf.extend_from_slice(content);
        Ok(())
    }

    fn expect_primitive(id: Ident, what: &'static str) -> BerResult<()> {
        if id.is_constructed() {
            return Err(BerError::ExpectedPrimitive(what));
        }
        Ok(())
    }

    /// Encode a NULL.
    pub fn encode_null(&mut self) -> BerResult<()> {
        self.encode_null_with(Ident::EMPTY)
    }

    pub fn encode_null_with(&mut self, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::NULL);
        Self::expect_primitive(id, "null")?;
        self.push_tlv(&[], id)
    }

    /// Encode a BOOLEAN; true is 0xFF.
    pub fn encode_bool(&mut self, val: bool) -> BerResult<()> {
        self.encode_bool_with(val, Ident::EMPTY)
    }

    pub fn encode_bool_with(&mut self, val: bool, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::BOOL);
        Self::expect_primitive(id, "bool")?;
        self.push_tlv(&[if val { 0xff } else { 0x00 }], id)
    }

    /// Encode a signed INTEGER in minimal two's-complement form.
    pub fn encode_int(&mut self, val: i64) -> BerResult<()> {
        self.encode_int_with(val, Ident::EMPTY)
    }

    pub fn encode_int_with(&mut self, val: i64, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::INTEGER);
        Self::expect_primitive(id, "int")?;
        self.push_tlv(&encode_int(val), id)
    }

    /// Encode an unsigned INTEGER; a 0x00 octet is prepended when the
    /// top bit is set so the value cannot be misread as negative.
    pub fn encode_uint(&mut self, val: u64) -> BerResult<()> {
        self.encode_uint_with(val, Ident::EMPTY)
    }

    pub fn encode_uint_with(&mut self, val: u64, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::INTEGER);
        Self::expect_primitive(id, "uint")?;
        self.push_tlv(&encode_uint(val), id)
    }

    /// Encode an ENUMERATED value.
    pub fn encode_enumerated(&mut self, val: i64) -> BerResult<()> {
        self.encode_enumerated_with(val, Ident::EMPTY)
    }

    pub fn encode_enumerated_with(&mut self, val: i64, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::ENUMERATED);
        Self::expect_primitive(id, "enumerated")?;
        self.push_tlv(&encode_int(val), id)
    }

    /// Encode a REAL with a base-2 mantissa/exponent encoding.
    pub fn encode_real_base2(&mut self, val: f64) -> BerResult<()> {
        self.encode_real_base2_with(val, Ident::EMPTY)
    }

    pub fn encode_real_base2_with(&mut self, val: f64, id: Ident) -> BerResult<()> {
        self.encode_real(val, 2, id)
    }

    /// Encode a REAL in the base-10 character form.
    pub fn encode_real_base10(&mut self, val: f64) -> BerResult<()> {
        self.encode_real_base10_with(val, Ident::EMPTY)
    }

    pub fn encode_real_base10_with(&mut self, val: f64, id: Ident) -> BerResult<()> {
        self.encode_real(val, 10, id)
    }

    fn encode_real(&mut self, val: f64, base: u32, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::REAL);
        Self::expect_primitive(id, "real")?;
        if let Some(content) = encode_special(val) {
            return self.push_tlv(&content, id);
        }
        let content = match base {
            2 => encode_binary(val)?,
            10 => encode_decimal(val),
            _ => return Err(BerError::UnsupportedRealBase(base)),
        };
        self.push_tlv(&content, id)
    }

    /// Encode a UTF8String.
    pub fn encode_utf8(&mut self, val: &str) -> BerResult<()> {
        self.encode_string_with(val, Ident::UTF8_STRING)
    }

    /// Encode a PrintableString; the alphabet is validated.
    pub fn encode_printable(&mut self, val: &str) -> BerResult<()> {
        self.encode_string_with(val, Ident::PRINTABLE_STRING)
    }

    /// Encode an IA5String; code points must be in 0..=127.
    pub fn encode_ia5(&mut self, val: &str) -> BerResult<()> {
        self.encode_string_with(val, Ident::IA5_STRING)
    }

    /// Encode a character string under `id`, validating the alphabet
    /// the identifier's tag number calls for.
    pub fn encode_string_with(&mut self, val: &str, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::UTF8_STRING);
        if id.tag() == Ident::PRINTABLE_STRING.tag() && !valid_printable_string(val) {
            return Err(BerError::InvalidCharacter(format!(
                "{val}: not a printable string"
            )));
        }
        if id.tag() == Ident::IA5_STRING.tag() && !valid_ia5_string(val) {
            return Err(BerError::InvalidCharacter(format!(
                "{val}: not an IA5 string"
            )));
        }
        self.push_tlv(val.as_bytes(), id)
    }

    /// Encode an OCTET STRING.
    pub fn encode_bytes(&mut self, val: &[u8]) -> BerResult<()> {
        self.encode_bytes_with(val, Ident::EMPTY)
    }

    pub fn encode_bytes_with(&mut self, val: &[u8], id: Ident) -> BerResult<()> {
        self.push_tlv(val, id.or_default(Ident::OCTET_STRING))
    }

    /// Encode a dotted-decimal OBJECT IDENTIFIER.
    pub fn encode_oid(&mut self, val: &str) -> BerResult<()> {
        self.encode_oid_with(val, Ident::OBJECT_ID)
    }

    /// Encode a relative OID, written with a leading dot.
    pub fn encode_rel_oid(&mut self, val: &str) -> BerResult<()> {
        self.encode_oid_with(val, Ident::REL_OBJECT_ID)
    }

    /// Encode an OID under `id`. The first-pair merge applies when the
    /// tag number is ObjectIdentifier's; any other tag encodes the arcs
    /// without merging.
    pub fn encode_oid_with(&mut self, val: &str, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::OBJECT_ID);
        Self::expect_primitive(id, "oid")?;
        let content = if id.tag() == Ident::OBJECT_ID.tag() {
            encode_oid(val)?
        } else {
            encode_rel_oid(val)?
        };
        self.push_tlv(&content, id)
    }

    /// Encode a UTCTime; the year must lie in 1950..=2050.
    pub fn encode_utc_time(&mut self, at: &DateTime) -> BerResult<()> {
        self.encode_time_with(at, Ident::UTC_TIME)
    }

    /// Encode a GeneralizedTime; the year must lie in 0..=9999.
    pub fn encode_generalized_time(&mut self, at: &DateTime) -> BerResult<()> {
        self.encode_time_with(at, Ident::GENERALIZED_TIME)
    }

    /// Encode a time under `id`: UTCTime and GeneralizedTime write
    /// their ASCII forms, Integer writes seconds since the Unix epoch.
    pub fn encode_time_with(&mut self, at: &DateTime, id: Ident) -> BerResult<()> {
        let id = id.or_default(Ident::GENERALIZED_TIME);
        if id.tag() == Ident::INTEGER.tag() {
            return self.encode_int(at.unix_seconds());
        }
        let text = if id.tag() == Ident::UTC_TIME.tag() {
            if !at.in_utc_range() {
                return Err(BerError::InvalidTimeRange(format!(
                    "{at}: outside the UTCTime years"
                )));
            }
            format_utc(at)
        } else if id.tag() == Ident::GENERALIZED_TIME.tag() {
            if !at.in_generalized_range() {
                return Err(BerError::InvalidTimeRange(format!(
                    "{at}: outside the GeneralizedTime years"
                )));
            }
            format_generalized(at)
        } else {
            return Err(BerError::InvalidTimeIdent);
        };
        self.push_tlv(text.as_bytes(), id)
    }

    /// Append pre-encoded TLV bytes verbatim.
    pub fn encode_raw(&mut self, tlv: &[u8]) -> BerResult<()> {
        self.buf.extend_from_slice(tlv);
        Ok(())
    }

    /// Encode any [`BerEncode`] value with its default identifier.
    pub fn encode<T: BerEncode + ?Sized>(&mut self, val: &T) -> BerResult<()> {
        val.encode_with(self, Ident::EMPTY)
    }

    /// Encode any [`BerEncode`] value under a caller-chosen identifier.
    pub fn encode_with<T: BerEncode + ?Sized>(&mut self, val: &T, id: Ident) -> BerResult<()> {
        val.encode_with(self, id)
    }

    /// Build a nested constructed value: `build` fills a fresh child
    /// encoder, whose buffer is then wrapped as a SEQUENCE and appended.
    pub fn encode_child<F>(&mut self, build: F) -> BerResult<()>
    where
        F: FnOnce(&mut Encoder) -> BerResult<()>,
    {
        self.encode_child_with(Ident::EMPTY, build)
    }

    /// Like [`Encoder::encode_child`], wrapping under `id` instead.
    pub fn encode_child_with<F>(&mut self, id: Ident, build: F) -> BerResult<()>
    where
        F: FnOnce(&mut Encoder) -> BerResult<()>,
    {
        let mut child = Encoder::new();
        build(&mut child)?;
        let wrapped = child.as_ident(id.or_default(Ident::SEQUENCE))?;
        self.buf.extend_from_slice(&wrapped);
        Ok(())
    }

    /// The accumulated buffer wrapped as a SEQUENCE. The encoder keeps
    /// its contents and stays usable.
    pub fn as_sequence(&self) -> BerResult<Vec<u8>> {
        self.as_ident(Ident::SEQUENCE)
    }

    /// The accumulated buffer wrapped as a SET.
    pub fn as_set(&self) -> BerResult<Vec<u8>> {
        self.as_ident(Ident::SET)
    }

    /// The accumulated buffer wrapped under `id`. The constructed bit
    /// is set on the emitted header whatever its state in `id`.
    pub fn as_ident(&self, id: Ident) -> BerResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.buf.len() + 12);
        encode_identifier(id.as_constructed(), &mut out);
        encode_length(self.buf.len(), &mut out)?;
        out.extend_from_slice(&self.buf);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null() {
        let mut enc = Encoder::new();
        enc.encode_null().unwrap();
        assert_eq!(enc.as_bytes(), [0x05, 0x00]);
    }

    #[test]
    fn bool_tlv() {
        let mut enc = Encoder::new();
        enc.encode_bool(true).unwrap();
        enc.encode_bool(false).unwrap();
        assert_eq!(enc.as_bytes(), [0x01, 0x01, 0xff, 0x01, 0x01, 0x00]);
    }

    #[test]
    fn int_tlv() {
        let cases: &[(i64, &[u8])] = &[
            (0, &[0x02, 0x01, 0x00]),
            (127, &[0x02, 0x01, 0x7f]),
            (128, &[0x02, 0x02, 0x00, 0x80]),
            (-128, &[0x02, 0x01, 0x80]),
            (-129, &[0x02, 0x02, 0xff, 0x7f]),
        ];
        for &(val, want) in cases {
            let mut enc = Encoder::new();
            enc.encode_int(val).unwrap();
            assert_eq!(enc.as_bytes(), want, "encoding {val}");
        }
    }

    #[test]
    fn real_tlv() {
        let mut enc = Encoder::new();
        enc.encode_real_base2(0.625).unwrap();
        assert_eq!(enc.as_bytes(), [0x09, 0x03, 0x80, 0xfd, 0x05]);

        let mut enc = Encoder::new();
        enc.encode_real_base2(0.0).unwrap();
        enc.encode_real_base2(-0.0).unwrap();
        enc.encode_real_base2(f64::INFINITY).unwrap();
        enc.encode_real_base2(f64::NEG_INFINITY).unwrap();
        enc.encode_real_base2(f64::NAN).unwrap();
        assert_eq!(
            enc.as_bytes(),
            [0x09, 0x00, 0x09, 0x01, 0x43, 0x09, 0x01, 0x40, 0x09, 0x01, 0x41, 0x09, 0x01, 0x42]
        );

        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_real(0.625, 8, Ident::EMPTY),
            Err(BerError::UnsupportedRealBase(8))
        ));
        assert!(enc.is_empty());
    }

    #[test]
    fn strings() {
        let mut enc = Encoder::new();
        enc.encode_utf8("foobar").unwrap();
        enc.encode_ia5("foobar").unwrap();
        enc.encode_printable("foobar").unwrap();
        assert_eq!(
            enc.as_bytes(),
            [
                0x0c, 0x06, b'f', b'o', b'o', b'b', b'a', b'r', //
                0x16, 0x06, b'f', b'o', b'o', b'b', b'a', b'r', //
                0x13, 0x06, b'f', b'o', b'o', b'b', b'a', b'r',
            ]
        );
    }

    #[test]
    fn constructed_strings_keep_contiguous_content() {
        // accepted deviation: the constructed bit is carried through,
        // the content is not segmented
        let mut enc = Encoder::new();
        enc.encode_string_with("foobar", Ident::UTF8_STRING.as_constructed())
            .unwrap();
        enc.encode_string_with("foobar", Ident::IA5_STRING.as_constructed())
            .unwrap();
        enc.encode_string_with("foobar", Ident::PRINTABLE_STRING.as_constructed())
            .unwrap();
        assert_eq!(
            enc.as_bytes(),
            [
                0x2c, 0x06, b'f', b'o', b'o', b'b', b'a', b'r', //
                0x36, 0x06, b'f', b'o', b'o', b'b', b'a', b'r', //
                0x33, 0x06, b'f', b'o', b'o', b'b', b'a', b'r',
            ]
        );
    }

    #[test]
    fn string_alphabets_validated() {
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_printable("a@b"),
            Err(BerError::InvalidCharacter(_))
        ));
        assert!(matches!(
            enc.encode_ia5("caf\u{e9}"),
            Err(BerError::InvalidCharacter(_))
        ));
        assert!(enc.is_empty());
    }

    #[test]
    fn oid_tlv() {
        let mut enc = Encoder::new();
        enc.encode_oid("1.2.840.113549.1.1.11").unwrap();
        assert_eq!(
            enc.as_bytes(),
            [0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b]
        );

        let mut enc = Encoder::new();
        enc.encode_rel_oid(".8571.3.2").unwrap();
        assert_eq!(enc.as_bytes(), [0x0d, 0x04, 0xc2, 0x7b, 0x03, 0x02]);
    }

    #[test]
    fn time_tlv() {
        let at = DateTime::new(2019, 12, 15, 19, 2, 10).unwrap();

        let mut enc = Encoder::new();
        enc.encode_utc_time(&at).unwrap();
        assert_eq!(
            enc.as_bytes(),
            [
                0x17, 0x11, 0x31, 0x39, 0x31, 0x32, 0x31, 0x35, 0x31, 0x39, 0x30, 0x32, 0x31,
                0x30, 0x2b, 0x30, 0x30, 0x30, 0x30
            ]
        );

        let mut enc = Encoder::new();
        enc.encode_generalized_time(&at).unwrap();
        assert_eq!(
            enc.as_bytes(),
            [
                0x18, 0x13, 0x32, 0x30, 0x31, 0x39, 0x31, 0x32, 0x31, 0x35, 0x31, 0x39, 0x30,
                0x32, 0x31, 0x30, 0x2b, 0x30, 0x30, 0x30, 0x30
            ]
        );
    }

    #[test]
    fn time_out_of_range() {
        let at = DateTime::new(1900, 1, 1, 0, 0, 0).unwrap();
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_utc_time(&at),
            Err(BerError::InvalidTimeRange(_))
        ));
        enc.encode_generalized_time(&at).unwrap();
    }

    #[test]
    fn primitive_ops_reject_constructed_identifier() {
        let mut enc = Encoder::new();
        assert!(matches!(
            enc.encode_bool_with(true, Ident::BOOL.as_constructed()),
            Err(BerError::ExpectedPrimitive("bool"))
        ));
        assert!(matches!(
            enc.encode_int_with(1, Ident::INTEGER.as_constructed()),
            Err(BerError::ExpectedPrimitive("int"))
        ));
        assert!(matches!(
            enc.encode_null_with(Ident::NULL.as_constructed()),
            Err(BerError::ExpectedPrimitive("null"))
        ));
        assert!(enc.is_empty());
    }

    #[test]
    fn wrap_as_sequence_and_set() {
        let body = [
            0x01, 0x01, 0xff, 0x17, 0x11, 0x31, 0x39, 0x31, 0x32, 0x31, 0x35, 0x31, 0x39, 0x30,
            0x32, 0x31, 0x30, 0x2b, 0x30, 0x30, 0x30, 0x30, 0x0c, 0x06, b'f', b'o', b'o', b'b',
            b'a', b'r', 0x02, 0x01, 0x80, 0x09, 0x03, 0x80, 0xfd, 0x05,
        ];
        let at = DateTime::new(2019, 12, 15, 19, 2, 10).unwrap();

        let mut enc = Encoder::new();
        enc.encode_bool(true).unwrap();
        enc.encode_utc_time(&at).unwrap();
        enc.encode_utf8("foobar").unwrap();
        enc.encode_int(-128).unwrap();
        enc.encode_real_base2(0.625).unwrap();

        let mut seq = vec![0x30, 0x26];
        seq.extend_from_slice(&body);
        assert_eq!(enc.as_sequence().unwrap(), seq);

        // the finalizer leaves the encoder reusable
        let mut set = vec![0x31, 0x26];
        set.extend_from_slice(&body);
        assert_eq!(enc.as_set().unwrap(), set);
    }

    #[test]
    fn child_encoding_nests() {
        let mut enc = Encoder::new();
        enc.encode_child(|inner| {
            inner.encode_int(123)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(enc.as_bytes(), [0x30, 0x03, 0x02, 0x01, 0x7b]);

        let mut enc = Encoder::new();
        enc.encode_child_with(Ident::constructed(0).context(), |inner| {
            inner.encode_null()
        })
        .unwrap();
        assert_eq!(enc.as_bytes(), [0xa0, 0x02, 0x05, 0x00]);
    }

    #[test]
    fn long_content_uses_long_form_length() {
        let mut enc = Encoder::new();
        enc.encode_bytes(&[0xaa; 300]).unwrap();
        assert_eq!(&enc.as_bytes()[..4], [0x04, 0x82, 0x01, 0x2c]);
        assert_eq!(enc.len(), 4 + 300);
    }
}
