use proc_macro2::TokenStream;
use quote::quote;

use crate::field::{analyze, ident_expr, Role};

pub(crate) fn expand(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let record = analyze(input)?;
    let name = record.name;

    // fields initialize in declaration order, each consuming one TLV
    // from the record's content
    let mut inits = Vec::new();
    for field in &record.fields {
        let fname = field.name;
        match field.role {
            Role::Skip => {
                inits.push(quote!(#fname: ::core::default::Default::default()));
            }
            Role::Outer => {
                inits.push(quote!(#fname: outer));
            }
            Role::Normal => {
                let ty = field.ty;
                let id = ident_expr(&field.ann, quote!(<#ty as ::ber::BerDecode>::IDENT));
                inits.push(quote! {
                    #fname: {
                        let field_id = #id;
                        ::ber::BerDecode::decode_with(&mut child, field_id)?
                    }
                });
            }
        }
    }

    let has_fields = record
        .fields
        .iter()
        .any(|field| matches!(field.role, Role::Normal));
    let child = if has_fields {
        quote!(mut child)
    } else {
        quote!(_child)
    };
    let outer = if record.outer().is_some() {
        quote!(outer)
    } else {
        quote!(_outer)
    };

    Ok(quote! {
        #[automatically_derived]
        impl ::ber::BerDecode for #name {
            const IDENT: ::ber::Ident = ::ber::Ident::SEQUENCE;

            fn decode_with(
                dec: &mut ::ber::Decoder,
                _id: ::ber::Ident,
            ) -> ::ber::BerResult<Self> {
                let (#outer, #child) = dec.descend()?;
                Ok(Self {
                    #(#inits,)*
                })
            }
        }
    })
}
