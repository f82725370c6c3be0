//! OBJECT IDENTIFIER and relative OID content octets.
//!
//! OIDs are written in dotted-decimal text form, `1.2.840.113549.1.1.11`.
//! On the wire every arc is base-128 with continuation bits; an absolute
//! OID merges its first two arcs into the single value `40 * arc0 + arc1`.
//! Relative OIDs carry a leading dot in text form and skip the merge.

use crate::error::{BerError, BerResult};
use crate::ident::{decode_base128, encode_base128};

/// Content octets for an absolute OID. At least two arcs are required.
pub(crate) fn encode_oid(text: &str) -> BerResult<Vec<u8>> {
    let arcs = split_arcs(text)?;
    if arcs.len() < 2 {
        return Err(BerError::InvalidOid(format!("{text}: short OID")));
    }
    let first = 40u32
        .checked_mul(arcs[0])
        .and_then(|v| v.checked_add(arcs[1]))
        .ok_or_else(|| BerError::InvalidOid(format!("{text}: first arcs too large")))?;
    let mut out = Vec::with_capacity(arcs.len() + 1);
    encode_base128(first, &mut out);
    for &arc in &arcs[2..] {
        encode_base128(arc, &mut out);
    }
    Ok(out)
}

/// Content octets for a relative OID; a leading dot is tolerated.
pub(crate) fn encode_rel_oid(text: &str) -> BerResult<Vec<u8>> {
    let arcs = split_arcs(text.trim_start_matches('.'))?;
    if arcs.is_empty() {
        return Err(BerError::InvalidOid(format!("{text}: empty OID")));
    }
    let mut out = Vec::with_capacity(arcs.len());
    for &arc in &arcs {
        encode_base128(arc, &mut out);
    }
    Ok(out)
}

/// Render an absolute OID from content octets, splitting the merged
/// first value into `value / 40` and `value % 40`.
pub(crate) fn decode_oid(content: &[u8]) -> BerResult<String> {
    if content.is_empty() {
        return Err(BerError::InvalidOid("empty object identifier".into()));
    }
    let (first, mut pos) = decode_base128(content)?;
    let mut text = format!("{}.{}", first / 40, first % 40);
    while pos < content.len() {
        let (arc, used) = decode_base128(&content[pos..])?;
        pos += used;
        text.push('.');
        text.push_str(&arc.to_string());
    }
    Ok(text)
}

/// Render a relative OID with its leading dot.
pub(crate) fn decode_rel_oid(content: &[u8]) -> BerResult<String> {
    if content.is_empty() {
        return Err(BerError::InvalidOid("empty relative identifier".into()));
    }
    let mut text = String::new();
    let mut pos = 0;
    while pos < content.len() {
        let (arc, used) = decode_base128(&content[pos..])?;
        pos += used;
        text.push('.');
        text.push_str(&arc.to_string());
    }
    Ok(text)
}

fn split_arcs(text: &str) -> BerResult<Vec<u32>> {
    text.split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| BerError::InvalidOid(format!("{text}: arc {part:?} not a u32")))
        })
        .collect()
}
