//! BER decoder: a cursor over a byte buffer, reading TLV triplets.

use crate::error::{BerError, BerResult};
use crate::ident::{decode_identifier, Ident};
use crate::int::{decode_int, decode_uint};
use crate::length::decode_length;
use crate::oid::{decode_oid, decode_rel_oid};
use crate::real::decode_real;
use crate::time::{parse_generalized, parse_utc, DateTime};
use crate::traits::{BerDecode, Raw};

/// What form a decode operation requires of the identifier it reads.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Form {
    Primitive,
    Constructed,
    Any,
}

/// A fully parsed TLV at the current offset: identifier, content
/// bounds within the buffer, and the total size to advance by.
struct View {
    id: Ident,
    start: usize,
    end: usize,
    total: usize,
}

/// BER decoder over an owned buffer.
///
/// Decode operations read one TLV at the current offset and advance
/// past it; a failed operation leaves the offset where it was, so the
/// caller can inspect or retry. The offset never moves backwards and
/// never passes the end of the buffer.
///
/// For streaming inputs, [`Decoder::append`] grows the buffer (already
/// consumed bytes are compacted away first) and [`Decoder::can`] tells
/// whether a complete TLV is available.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
    offset: usize,
    bounded: bool,
}

impl Decoder {
    /// Create a decoder over `input`.
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: input.into(),
            offset: 0,
            bounded: false,
        }
    }

    /// A child decoder over the content of a constructed value; reads
    /// that run out of content report `OverConsume`.
    fn bounded(content: Vec<u8>) -> Self {
        Self {
            buf: content,
            offset: 0,
            bounded: true,
        }
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.buf.len()
    }

    /// Bytes left to decode.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Extend the buffer with more input. Bytes before the offset are
    /// compacted away first so the buffer does not grow unboundedly.
    pub fn append(&mut self, more: &[u8]) {
        if self.offset > 0 {
            log::trace!("compacting {} consumed bytes", self.offset);
            self.buf.drain(..self.offset);
            self.offset = 0;
        }
        self.buf.extend_from_slice(more);
    }

    /// Replace the buffer and rewind the offset.
    pub fn reset(&mut self, input: impl Into<Vec<u8>>) {
        self.buf = input.into();
        self.offset = 0;
    }

    fn rest(&self) -> &[u8] {
        &self.buf[self.offset.min(self.buf.len())..]
    }

    /// Truncation error for this decoder: plain `ShortBuffer` at the
    /// top level, `OverConsume` inside a constructed value.
    fn short(&self) -> BerError {
        if self.bounded {
            BerError::OverConsume
        } else {
            BerError::ShortBuffer
        }
    }

    /// The identifier at the current offset, without advancing.
    pub fn peek(&self) -> BerResult<Ident> {
        let (id, _) = decode_identifier(self.rest()).map_err(|e| self.map_short(e))?;
        Ok(id)
    }

    /// Total byte count of the TLV at the current offset, counting its
    /// header, whether or not the content has fully arrived.
    pub fn need(&self) -> BerResult<usize> {
        let rest = self.rest();
        let (_, id_len) = decode_identifier(rest).map_err(|e| self.map_short(e))?;
        let (content_len, len_len) = decode_length(&rest[id_len..]).map_err(|e| self.map_short(e))?;
        Ok(id_len + len_len + content_len)
    }

    /// True when a complete TLV is available at the current offset.
    pub fn can(&self) -> bool {
        matches!(self.need(), Ok(total) if self.remaining() >= total)
    }

    /// Advance past one complete TLV, returning its total size.
    pub fn skip(&mut self) -> BerResult<usize> {
        let view = self.view("skip", Form::Any)?;
        self.offset += view.total;
        Ok(view.total)
    }

    fn map_short(&self, err: BerError) -> BerError {
        match err {
            BerError::ShortBuffer => self.short(),
            other => other,
        }
    }

    /// Parse the TLV at the current offset without advancing, checking
    /// the identifier form `what` requires.
    fn view(&self, what: &'static str, form: Form) -> BerResult<View> {
        let rest = self.rest();
        let (id, id_len) = decode_identifier(rest).map_err(|e| self.map_short(e))?;
        let (content_len, len_len) = decode_length(&rest[id_len..]).map_err(|e| self.map_short(e))?;
        let header = id_len + len_len;
        if rest.len() < header + content_len {
            return Err(self.short());
        }
        match form {
            Form::Primitive if id.is_constructed() => {
                return Err(BerError::ExpectedPrimitive(what))
            }
            Form::Constructed if !id.is_constructed() => {
                return Err(BerError::ExpectedConstructed(what))
            }
            _ => {}
        }
        Ok(View {
            id,
            start: self.offset + header,
            end: self.offset + header + content_len,
            total: header + content_len,
        })
    }

    fn content(&self, view: &View) -> &[u8] {
        &self.buf[view.start..view.end]
    }

    /// Decode a NULL.
    pub fn decode_null(&mut self) -> BerResult<()> {
        let view = self.view("null", Form::Primitive)?;
        if view.end != view.start {
            return Err(BerError::LengthMismatch {
                expected: 0,
                actual: view.end - view.start,
            });
        }
        self.offset += view.total;
        Ok(())
    }

    /// Decode a BOOLEAN; any nonzero content octet is true.
    pub fn decode_bool(&mut self) -> BerResult<bool> {
        let view = self.view("bool", Form::Primitive)?;
        if view.end - view.start != 1 {
            return Err(BerError::LengthMismatch {
                expected: 1,
                actual: view.end - view.start,
            });
        }
        let val = self.buf[view.start] != 0;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode a signed INTEGER or ENUMERATED value.
    pub fn decode_int(&mut self) -> BerResult<i64> {
        let view = self.view("int", Form::Primitive)?;
        let val = decode_int(self.content(&view))?;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode an INTEGER ignoring sign extension. Choosing between
    /// signed and unsigned is up to the caller; the bytes alone do not
    /// record which one was encoded.
    pub fn decode_uint(&mut self) -> BerResult<u64> {
        let view = self.view("uint", Form::Primitive)?;
        let val = decode_uint(self.content(&view))?;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode an ENUMERATED value.
    pub fn decode_enumerated(&mut self) -> BerResult<i64> {
        let view = self.view("enumerated", Form::Primitive)?;
        let val = decode_int(self.content(&view))?;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode a REAL in any of its sub-formats.
    pub fn decode_real(&mut self) -> BerResult<f64> {
        let view = self.view("real", Form::Primitive)?;
        let val = decode_real(self.content(&view))?;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode a character string. The alphabet is not re-validated;
    /// the content must only be well-formed UTF-8.
    pub fn decode_string(&mut self) -> BerResult<String> {
        let view = self.view("string", Form::Any)?;
        let val = String::from_utf8(self.content(&view).to_vec())
            .map_err(|_| BerError::InvalidCharacter("string content is not UTF-8".into()))?;
        self.offset += view.total;
        Ok(val)
    }

    /// Decode an OCTET STRING (or any TLV's raw content).
    pub fn decode_bytes(&mut self) -> BerResult<Vec<u8>> {
        let view = self.view("bytes", Form::Any)?;
        let val = self.content(&view).to_vec();
        self.offset += view.total;
        Ok(val)
    }

    /// Decode an object identifier into dotted-decimal text. A
    /// Relative-OID tag renders with a leading dot and no first-pair
    /// split; any other tag is treated as absolute.
    pub fn decode_oid(&mut self) -> BerResult<String> {
        let view = self.view("oid", Form::Primitive)?;
        let val = if view.id.tag() == Ident::REL_OBJECT_ID.tag() {
            decode_rel_oid(self.content(&view))?
        } else {
            decode_oid(self.content(&view))?
        };
        self.offset += view.total;
        Ok(val)
    }

    /// Decode a time value: UTCTime and GeneralizedTime from their
    /// ASCII forms, Integer as seconds since the Unix epoch. The result
    /// is normalized to UTC.
    pub fn decode_time(&mut self) -> BerResult<DateTime> {
        let view = self.view("time", Form::Primitive)?;
        let content = self.content(&view);
        let val = if view.id.tag() == Ident::UTC_TIME.tag() {
            parse_utc(std::str::from_utf8(content).map_err(Self::time_not_ascii)?)?
        } else if view.id.tag() == Ident::GENERALIZED_TIME.tag() {
            parse_generalized(std::str::from_utf8(content).map_err(Self::time_not_ascii)?)?
        } else if view.id.tag() == Ident::INTEGER.tag() {
            DateTime::from_unix_seconds(decode_int(content)?)
        } else {
            return Err(BerError::InvalidTimeIdent);
        };
        self.offset += view.total;
        Ok(val)
    }

    fn time_not_ascii(_: std::str::Utf8Error) -> BerError {
        BerError::InvalidCharacter("time content is not ASCII".into())
    }

    /// Capture one complete TLV verbatim.
    pub fn decode_raw(&mut self) -> BerResult<Raw> {
        let view = self.view("raw", Form::Any)?;
        let bytes = self.buf[self.offset..self.offset + view.total].to_vec();
        self.offset += view.total;
        Ok(Raw(bytes))
    }

    /// Enter a constructed value: returns its identifier and a child
    /// decoder restricted to the declared content. Reading past the
    /// content in the child reports `OverConsume`.
    pub fn descend(&mut self) -> BerResult<(Ident, Decoder)> {
        let view = self.view("constructed", Form::Constructed)?;
        let child = Decoder::bounded(self.content(&view).to_vec());
        self.offset += view.total;
        Ok((view.id, child))
    }

    /// Decode any [`BerDecode`] value.
    pub fn decode<T: BerDecode>(&mut self) -> BerResult<T> {
        T::decode_with(self, Ident::EMPTY)
    }

    /// Decode any [`BerDecode`] value, hinting the identifier the
    /// caller expects (annotated record fields pass their resolved
    /// identifier through here).
    pub fn decode_with<T: BerDecode>(&mut self, id: Ident) -> BerResult<T> {
        T::decode_with(self, id)
    }
}
