//! BER (Basic Encoding Rules) encoding and decoding for ASN.1 values.
//!
//! Every BER value is a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Identifier] [Length] [Content]
//! ```
//!
//! The identifier carries a class, a primitive/constructed bit and a
//! tag number ([`Ident`]); the length is definite form only, short for
//! content up to 127 bytes and long above that.
//!
//! The crate offers three levels of access:
//!
//! - **Streaming**: [`Encoder`] appends typed TLVs to a buffer and can
//!   wrap the result as a constructed value; [`Decoder`] walks a byte
//!   buffer with typed reads, peek/skip, and streaming append.
//! - **Static mapping**: the [`BerEncode`] / [`BerDecode`] traits cover
//!   the std scalar and container types, and the `ber-derive` macros
//!   extend them to records, with `#[ber("…")]` field annotations for
//!   identifier overrides (see [`annotation`]).
//! - **Dynamic mapping**: [`Value`] decodes input of unknown shape,
//!   keeping whatever identifier the wire carries.
//!
//! # Example
//!
//! ```
//! use ber::{Decoder, Encoder};
//!
//! let mut enc = Encoder::new();
//! enc.encode_int(-128)?;
//! enc.encode_utf8("foobar")?;
//! let pdu = enc.as_sequence()?;
//!
//! let mut dec = Decoder::new(pdu);
//! let (_, mut body) = dec.descend()?;
//! assert_eq!(body.decode_int()?, -128);
//! assert_eq!(body.decode_string()?, "foobar");
//! # Ok::<(), ber::BerError>(())
//! ```

pub mod annotation;
mod decoder;
mod encoder;
mod error;
mod ident;
mod int;
mod length;
mod oid;
mod real;
mod text;
mod time;
mod traits;
mod value;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{BerError, BerResult};
pub use ident::{Ident, TagClass};
pub use text::{valid_ia5_string, valid_printable_string};
pub use time::DateTime;
pub use traits::{BerDecode, BerEncode, OctetString, Raw};
pub use value::Value;
