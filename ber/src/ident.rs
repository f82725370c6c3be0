//! BER identifiers: tag class, primitive/constructed form and tag number.
//!
//! Every BER value starts with an identifier octet:
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//!
//! CC is the class (00=Universal, 01=Application, 10=Context, 11=Private),
//! P the primitive (0) or constructed (1) form, and TTTTT the tag number.
//! Tag numbers above 30 set all five T bits and continue in base-128
//! continuation bytes, most significant group first, bit 8 set on every
//! group except the last.

use serde::{Deserialize, Serialize};

use crate::error::{BerError, BerResult};

/// BER tag class, from bits 8-7 of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Universal class (00): standard ASN.1 types
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10): field positions in SEQUENCE/SET
    Context = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Tag class from the top two bits of an identifier octet.
    pub fn from_bits(byte: u8) -> Self {
        match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    /// The class positioned in bits 8-7, ready to OR into an identifier octet.
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

const FORM_BIT: u64 = 1 << 32;
const CLASS_SHIFT: u64 = 33;
const TAG_MASK: u64 = 0xFFFF_FFFF;

/// A BER identifier packed into a single word: the tag number in the low
/// 32 bits, the constructed bit at bit 32, the class in bits 33-34.
///
/// `Ident::EMPTY` (all fields zero) is a sentinel meaning "the caller has
/// not chosen an identifier"; operations receiving it substitute their
/// type's default. Note the sentinel is distinct from a real identifier
/// only at API boundaries: Universal/Primitive/tag-0 cannot be expressed
/// through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ident(u64);

impl Ident {
    /// The "no identifier chosen" sentinel.
    pub const EMPTY: Ident = Ident(0);

    pub const BOOL: Ident = Ident::primitive(0x01);
    pub const INTEGER: Ident = Ident::primitive(0x02);
    pub const BIT_STRING: Ident = Ident::primitive(0x03);
    pub const OCTET_STRING: Ident = Ident::primitive(0x04);
    pub const NULL: Ident = Ident::primitive(0x05);
    pub const OBJECT_ID: Ident = Ident::primitive(0x06);
    pub const REAL: Ident = Ident::primitive(0x09);
    pub const ENUMERATED: Ident = Ident::primitive(0x0a);
    pub const UTF8_STRING: Ident = Ident::primitive(0x0c);
    pub const REL_OBJECT_ID: Ident = Ident::primitive(0x0d);
    pub const SEQUENCE: Ident = Ident::constructed(0x10);
    pub const SET: Ident = Ident::constructed(0x11);
    pub const PRINTABLE_STRING: Ident = Ident::primitive(0x13);
    pub const IA5_STRING: Ident = Ident::primitive(0x16);
    pub const UTC_TIME: Ident = Ident::primitive(0x17);
    pub const GENERALIZED_TIME: Ident = Ident::primitive(0x18);

    /// A Universal, primitive identifier with the given tag number.
    pub const fn primitive(tag: u32) -> Self {
        Ident(tag as u64)
    }

    /// A Universal, constructed identifier with the given tag number.
    pub const fn constructed(tag: u32) -> Self {
        Ident(tag as u64 | FORM_BIT)
    }

    /// Assemble an identifier from all three fields.
    pub const fn new(class: TagClass, constructed: bool, tag: u32) -> Self {
        let form = if constructed { FORM_BIT } else { 0 };
        Ident(tag as u64 | form | (class as u64) << CLASS_SHIFT)
    }

    pub fn class(self) -> TagClass {
        match (self.0 >> CLASS_SHIFT) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    pub const fn is_constructed(self) -> bool {
        self.0 & FORM_BIT != 0
    }

    pub const fn tag(self) -> u32 {
        (self.0 & TAG_MASK) as u32
    }

    /// True for the `EMPTY` sentinel.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `self`, or `default` when `self` is the sentinel.
    pub fn or_default(self, default: Ident) -> Ident {
        if self.is_empty() {
            default
        } else {
            self
        }
    }

    /// Replace the tag number, keeping class and form.
    pub const fn with_tag(self, tag: u32) -> Ident {
        Ident(self.0 & !TAG_MASK | tag as u64)
    }

    /// Replace the class, keeping form and tag number.
    pub const fn with_class(self, class: TagClass) -> Ident {
        Ident(self.0 & !(0x03 << CLASS_SHIFT) | (class as u64) << CLASS_SHIFT)
    }

    pub const fn as_primitive(self) -> Ident {
        Ident(self.0 & !FORM_BIT)
    }

    pub const fn as_constructed(self) -> Ident {
        Ident(self.0 | FORM_BIT)
    }

    pub const fn universal(self) -> Ident {
        self.with_class(TagClass::Universal)
    }

    pub const fn application(self) -> Ident {
        self.with_class(TagClass::Application)
    }

    pub const fn context(self) -> Ident {
        self.with_class(TagClass::Context)
    }

    pub const fn private(self) -> Ident {
        self.with_class(TagClass::Private)
    }
}

/// Append the on-wire identifier octets for `id`.
///
/// Tag numbers up to 30 fit the initial octet; larger ones spill into
/// base-128 continuation bytes.
pub(crate) fn encode_identifier(id: Ident, out: &mut Vec<u8>) {
    let lead = id.class().to_bits() | if id.is_constructed() { 0x20 } else { 0x00 };
    let tag = id.tag();
    if tag < 31 {
        out.push(lead | tag as u8);
    } else {
        out.push(lead | 0x1f);
        encode_base128(tag, out);
    }
}

/// Decode an identifier from the head of `buf`, returning it together
/// with the number of bytes consumed.
pub(crate) fn decode_identifier(buf: &[u8]) -> BerResult<(Ident, usize)> {
    let Some(&lead) = buf.first() else {
        return Err(BerError::ShortBuffer);
    };
    let class = TagClass::from_bits(lead);
    let constructed = lead & 0x20 != 0;
    let low5 = (lead & 0x1f) as u32;
    if low5 < 31 {
        return Ok((Ident::new(class, constructed, low5), 1));
    }
    let (tag, used) = decode_base128(&buf[1..])?;
    Ok((Ident::new(class, constructed, tag), 1 + used))
}

/// Append `val` as base-128 with continuation bits: 7-bit groups, most
/// significant first, bit 8 set on all but the last group. Zero encodes
/// as a single 0x00 byte.
pub(crate) fn encode_base128(val: u32, out: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    let mut rest = val;
    loop {
        groups[n] = (rest & 0x7f) as u8;
        n += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let cont = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | cont);
    }
}

/// Decode one base-128 value from the head of `buf`.
pub(crate) fn decode_base128(buf: &[u8]) -> BerResult<(u32, usize)> {
    let mut val: u32 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if val > u32::MAX >> 7 {
            return Err(BerError::InvalidLength(
                "base-128 value exceeds 32 bits".into(),
            ));
        }
        val = (val << 7) | (byte & 0x7f) as u32;
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(BerError::ShortBuffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form() {
        let mut buf = Vec::new();
        encode_identifier(Ident::INTEGER, &mut buf);
        assert_eq!(buf, [0x02]);

        buf.clear();
        encode_identifier(Ident::SEQUENCE, &mut buf);
        assert_eq!(buf, [0x30]);

        buf.clear();
        encode_identifier(Ident::constructed(0).application(), &mut buf);
        assert_eq!(buf, [0x60]);
    }

    #[test]
    fn long_form() {
        let mut buf = Vec::new();
        encode_identifier(Ident::primitive(261), &mut buf);
        assert_eq!(buf, [0x1f, 0x82, 0x05]);
    }

    #[test]
    fn decode_short_form() {
        let (id, used) = decode_identifier(&[0x02]).unwrap();
        assert_eq!(used, 1);
        assert_eq!(id.class(), TagClass::Universal);
        assert!(!id.is_constructed());
        assert_eq!(id.tag(), 2);
    }

    #[test]
    fn decode_long_form() {
        let (id, used) = decode_identifier(&[0x1f, 0x82, 0x05]).unwrap();
        assert_eq!(used, 3);
        assert_eq!(id.tag(), 261);
    }

    #[test]
    fn decode_truncated_long_form() {
        assert!(matches!(
            decode_identifier(&[0x1f, 0x82]),
            Err(BerError::ShortBuffer)
        ));
        assert!(matches!(decode_identifier(&[]), Err(BerError::ShortBuffer)));
    }

    #[test]
    fn fluent_modifiers() {
        let id = Ident::INTEGER.context().with_tag(7);
        assert_eq!(id.class(), TagClass::Context);
        assert_eq!(id.tag(), 7);
        assert!(!id.is_constructed());

        let id = id.as_constructed().private();
        assert!(id.is_constructed());
        assert_eq!(id.class(), TagClass::Private);
        // replacing the class clears the previous one
        assert_eq!(id.universal().class(), TagClass::Universal);
    }

    #[test]
    fn empty_sentinel() {
        assert!(Ident::EMPTY.is_empty());
        assert!(!Ident::NULL.is_empty());
        assert_eq!(Ident::EMPTY.or_default(Ident::BOOL), Ident::BOOL);
        assert_eq!(Ident::SET.or_default(Ident::BOOL), Ident::SET);
    }

    #[test]
    fn base128_zero() {
        let mut buf = Vec::new();
        encode_base128(0, &mut buf);
        assert_eq!(buf, [0x00]);
    }

    #[test]
    fn base128_round_trip() {
        for val in [0u32, 1, 127, 128, 261, 8571, 113549, u32::MAX] {
            let mut buf = Vec::new();
            encode_base128(val, &mut buf);
            let (got, used) = decode_base128(&buf).unwrap();
            assert_eq!(got, val);
            assert_eq!(used, buf.len());
        }
    }
}
