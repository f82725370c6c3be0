//! Derive macros for the `ber` crate.
//!
//! `#[derive(BerEncode)]` and `#[derive(BerDecode)]` map a struct with
//! named fields onto a BER constructed value: fields encode in
//! declaration order into a SEQUENCE by default. A `#[ber("…")]`
//! attribute on a field carries the same comma-separated directives the
//! `ber::annotation` module parses (`tag:`, `class:`, `type:`,
//! `omitempty`, `printable`, `oid`, `-`, …); invalid directives are
//! reported at compile time.
//!
//! A field of type `Ident` named `id`, or annotated `#[ber("id")]`,
//! is not encoded itself: it supplies the record's outer identifier on
//! encode and receives it on decode.

use proc_macro::TokenStream;

mod decode;
mod encode;
mod field;

#[proc_macro_derive(BerEncode, attributes(ber))]
pub fn derive_ber_encode(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    encode::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(BerDecode, attributes(ber))]
pub fn derive_ber_decode(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    decode::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
