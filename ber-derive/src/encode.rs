use proc_macro2::TokenStream;
use quote::quote;

use crate::field::{analyze, ident_expr, Role};

pub(crate) fn expand(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let record = analyze(input)?;
    let name = record.name;

    let mut steps = Vec::new();
    for field in &record.fields {
        if !matches!(field.role, Role::Normal) {
            continue;
        }
        let fname = field.name;
        let ty = field.ty;
        let id = ident_expr(&field.ann, quote!(<#ty as ::ber::BerEncode>::IDENT));
        let encode = quote! {
            let field_id = #id;
            ::ber::BerEncode::encode_with(&self.#fname, child, field_id)?;
        };
        if field.ann.omit_empty {
            steps.push(quote! {
                if !::ber::BerEncode::is_empty_value(&self.#fname) {
                    #encode
                }
            });
        } else {
            steps.push(quote!(#encode));
        }
    }

    // an Ident field may replace the record's outer identifier
    let outer = match record.outer() {
        Some(field) => {
            let fname = field.name;
            quote! {
                let mut outer = id.or_default(<Self as ::ber::BerEncode>::IDENT);
                if !self.#fname.is_empty() {
                    outer = self.#fname;
                }
            }
        }
        None => quote! {
            let outer = id.or_default(<Self as ::ber::BerEncode>::IDENT);
        },
    };
    let is_empty = record.is_empty_record();
    let child = if steps.is_empty() {
        quote!(_child)
    } else {
        quote!(child)
    };

    Ok(quote! {
        #[automatically_derived]
        impl ::ber::BerEncode for #name {
            const IDENT: ::ber::Ident = ::ber::Ident::SEQUENCE;

            fn encode_with(
                &self,
                enc: &mut ::ber::Encoder,
                id: ::ber::Ident,
            ) -> ::ber::BerResult<()> {
                #outer
                enc.encode_child_with(outer, |#child| {
                    #(#steps)*
                    Ok(())
                })
            }

            fn is_empty_value(&self) -> bool {
                #is_empty
            }
        }
    })
}
