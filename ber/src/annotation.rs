//! The field-annotation grammar of the derive macros.
//!
//! An annotation is a comma-separated directive list applied to one
//! record field, for example `"printable,type:0x1"` or
//! `"tag:2,class:2,omitempty"`. Parsing is shared between the runtime
//! (this module) and `ber-derive`, which invokes it at macro expansion
//! time and reports `InvalidAnnotation` as a compile error.

use crate::error::{BerError, BerResult};
use crate::ident::{Ident, TagClass};

/// One parsed directive. Directives apply in writing order, each either
/// replacing the identifier outright or modifying one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// A keyword such as `printable` or `sequence`: replaces the whole
    /// identifier.
    Replace(Ident),
    /// `tag:N`
    Tag(u32),
    /// `class:K`
    Class(TagClass),
    /// `type:T`, true for constructed
    Form(bool),
}

/// A parsed field annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Identifier directives, in writing order.
    pub directives: Vec<Directive>,
    /// `omitempty`: skip the field when its value is empty.
    pub omit_empty: bool,
    /// `-`: never encode or decode this field.
    pub skip: bool,
    /// `id`: the field supplies the record's outer identifier.
    pub takes_ident: bool,
}

impl Annotation {
    /// Apply the identifier directives on top of `base`.
    pub fn resolve(&self, base: Ident) -> Ident {
        self.directives.iter().fold(base, |id, op| match *op {
            Directive::Replace(with) => with,
            Directive::Tag(tag) => id.with_tag(tag),
            Directive::Class(class) => id.with_class(class),
            Directive::Form(true) => id.as_constructed(),
            Directive::Form(false) => id.as_primitive(),
        })
    }
}

/// Parse an annotation string.
///
/// Unrecognized words are ignored; malformed `tag:`/`class:`/`type:`
/// arguments are `InvalidAnnotation` errors.
pub fn parse(text: &str) -> BerResult<Annotation> {
    let mut out = Annotation::default();
    if text.trim() == "-" {
        out.skip = true;
        return Ok(out);
    }
    for word in text.split(',') {
        let word = word.trim();
        if let Some(arg) = word.strip_prefix("tag:") {
            let tag = parse_number(arg)
                .ok_or_else(|| BerError::InvalidAnnotation(format!("{arg}: bad tag number")))?;
            out.directives.push(Directive::Tag(tag));
        } else if let Some(arg) = word.strip_prefix("class:") {
            let class = match parse_number(arg) {
                Some(0) => TagClass::Universal,
                Some(1) => TagClass::Application,
                Some(2) => TagClass::Context,
                Some(3) => TagClass::Private,
                _ => {
                    return Err(BerError::InvalidAnnotation(format!("{arg}: invalid class")));
                }
            };
            out.directives.push(Directive::Class(class));
        } else if let Some(arg) = word.strip_prefix("type:") {
            let constructed = match parse_number(arg) {
                Some(0) => false,
                Some(1) => true,
                _ => {
                    return Err(BerError::InvalidAnnotation(format!("{arg}: invalid type")));
                }
            };
            out.directives.push(Directive::Form(constructed));
        } else {
            match word {
                "omitempty" => out.omit_empty = true,
                "id" => out.takes_ident = true,
                "enumerated" => out.directives.push(Directive::Replace(Ident::ENUMERATED)),
                "sequence" => out.directives.push(Directive::Replace(Ident::SEQUENCE)),
                "set" => out.directives.push(Directive::Replace(Ident::SET)),
                "utc" => out.directives.push(Directive::Replace(Ident::UTC_TIME)),
                "generalized" => out
                    .directives
                    .push(Directive::Replace(Ident::GENERALIZED_TIME)),
                "ia5" => out.directives.push(Directive::Replace(Ident::IA5_STRING)),
                "printable" => out
                    .directives
                    .push(Directive::Replace(Ident::PRINTABLE_STRING)),
                "utf8" => out.directives.push(Directive::Replace(Ident::UTF8_STRING)),
                "octetstr" => out.directives.push(Directive::Replace(Ident::OCTET_STRING)),
                "oid" => out.directives.push(Directive::Replace(Ident::OBJECT_ID)),
                "roid" => out
                    .directives
                    .push(Directive::Replace(Ident::REL_OBJECT_ID)),
                _ => {}
            }
        }
    }
    Ok(out)
}

/// Parse a decimal, `0x` hexadecimal, or `0`-prefixed octal number.
fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u32::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}
