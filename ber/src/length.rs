//! Definite-form length octets.
//!
//! Lengths up to 127 use the short form, a single octet. Longer values
//! use the long form: an initial octet with bit 8 set and the count of
//! following octets in bits 7-1, then the length as minimal base-256,
//! big-endian. The indefinite form (initial octet 0x80) is not emitted
//! and not accepted.

use crate::error::{BerError, BerResult};

/// Append the definite-form length octets for `len`.
pub(crate) fn encode_length(len: usize, out: &mut Vec<u8>) -> BerResult<()> {
    if len <= 127 {
        out.push(len as u8);
        return Ok(());
    }
    let mut digits = Vec::with_capacity(8);
    encode_base256(len as u64, &mut digits);
    if digits.len() >= 0x7f {
        return Err(BerError::InvalidLength(format!(
            "{} length octets, at most 126 allowed",
            digits.len()
        )));
    }
    out.push(0x80 | digits.len() as u8);
    out.extend_from_slice(&digits);
    Ok(())
}

/// Decode length octets from the head of `buf`, returning the content
/// length together with the number of bytes consumed.
pub(crate) fn decode_length(buf: &[u8]) -> BerResult<(usize, usize)> {
    let Some(&lead) = buf.first() else {
        return Err(BerError::ShortBuffer);
    };
    if lead & 0x80 == 0 {
        return Ok(((lead & 0x7f) as usize, 1));
    }
    let count = (lead & 0x7f) as usize;
    if count == 0 {
        return Err(BerError::InvalidLength(
            "indefinite form not supported".into(),
        ));
    }
    if count > 8 {
        return Err(BerError::InvalidLength(format!(
            "{count} length octets, at most 8 supported"
        )));
    }
    if buf.len() < 1 + count {
        return Err(BerError::ShortBuffer);
    }
    let mut len: u64 = 0;
    for &byte in &buf[1..1 + count] {
        len = (len << 8) | byte as u64;
    }
    Ok((len as usize, 1 + count))
}

/// Append `val` as minimal base-256, big-endian. Zero yields no bytes;
/// callers that need at least one byte handle that case themselves.
pub(crate) fn encode_base256(val: u64, out: &mut Vec<u8>) {
    let mut started = false;
    for shift in (0..8).rev() {
        let byte = (val >> (shift * 8)) as u8;
        if byte != 0 {
            started = true;
        }
        if started {
            out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode() {
        let cases: &[(usize, &[u8])] = &[
            (0, &[0x00]),
            (34, &[0x22]),
            (127, &[0x7f]),
            (128, &[0x81, 0x80]),
            (201, &[0x81, 0xc9]),
            (2201, &[0x82, 0x08, 0x99]),
            (65536, &[0x83, 0x01, 0x00, 0x00]),
        ];
        for &(len, want) in cases {
            let mut buf = Vec::new();
            encode_length(len, &mut buf).unwrap();
            assert_eq!(buf, want, "length {len}");
        }
    }

    #[test]
    fn decode() {
        let cases: &[(&[u8], usize, usize)] = &[
            (&[0x22], 34, 1),
            (&[0x81, 0xc9], 201, 2),
            (&[0x82, 0x08, 0x99], 2201, 3),
        ];
        for &(input, want, used) in cases {
            assert_eq!(decode_length(input).unwrap(), (want, used));
        }
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(decode_length(&[]), Err(BerError::ShortBuffer)));
        assert!(matches!(
            decode_length(&[0x82, 0x08]),
            Err(BerError::ShortBuffer)
        ));
    }

    #[test]
    fn decode_indefinite_rejected() {
        assert!(matches!(
            decode_length(&[0x80]),
            Err(BerError::InvalidLength(_))
        ));
    }

    #[test]
    fn round_trip_is_minimal() {
        for len in [0usize, 1, 127, 128, 255, 256, 2201, 1 << 20] {
            let mut buf = Vec::new();
            encode_length(len, &mut buf).unwrap();
            // minimal: no redundant leading zero octet in the long form
            if buf.len() > 2 {
                assert_ne!(buf[1], 0, "length {len}");
            }
            assert_eq!(decode_length(&buf).unwrap(), (len, buf.len()));
        }
    }
}
