//! Per-field analysis shared by both derives.

use ber::annotation::{self, Annotation, Directive};
use ber::TagClass;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) enum Role {
    /// Encoded and decoded like any value.
    Normal,
    /// `-`: never touches the wire; decoding fills it with `Default`.
    Skip,
    /// Supplies the record's outer identifier.
    Outer,
}

pub(crate) struct Field<'a> {
    pub name: &'a syn::Ident,
    pub ty: &'a syn::Type,
    pub ann: Annotation,
    pub role: Role,
}

pub(crate) struct Record<'a> {
    pub name: &'a syn::Ident,
    pub fields: Vec<Field<'a>>,
}

impl Record<'_> {
    /// The field supplying the outer identifier, if any.
    pub fn outer(&self) -> Option<&Field<'_>> {
        self.fields.iter().find(|f| matches!(f.role, Role::Outer))
    }

    /// A derived record is "empty" for `omitempty` when it has no
    /// encodable fields at all.
    pub fn is_empty_record(&self) -> bool {
        !self.fields.iter().any(|f| matches!(f.role, Role::Normal))
    }
}

pub(crate) fn analyze(input: &syn::DeriveInput) -> syn::Result<Record<'_>> {
    let syn::Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "BerEncode/BerDecode can only be derived for structs",
        ));
    };
    let syn::Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "BerEncode/BerDecode requires named fields",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic records are not supported",
        ));
    }

    let mut record = Record {
        name: &input.ident,
        fields: Vec::with_capacity(named.named.len()),
    };
    let mut seen_outer = false;
    for field in &named.named {
        let name = field.ident.as_ref().expect("named field without a name");
        let ann = match ber_attribute(&field.attrs)? {
            Some(text) => annotation::parse(&text.value())
                .map_err(|err| syn::Error::new(text.span(), err.to_string()))?,
            None => Annotation::default(),
        };
        let takes_ident = ann.takes_ident || (name == "id" && is_ident_type(&field.ty));
        let role = if ann.skip {
            Role::Skip
        } else if takes_ident {
            if !is_ident_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    field,
                    "the id directive requires a field of type ber::Ident",
                ));
            }
            if seen_outer {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may supply the record identifier",
                ));
            }
            seen_outer = true;
            Role::Outer
        } else {
            Role::Normal
        };
        record.fields.push(Field {
            name,
            ty: &field.ty,
            ann,
            role,
        });
    }
    Ok(record)
}

/// The string literal of a `#[ber("…")]` attribute.
fn ber_attribute(attrs: &[syn::Attribute]) -> syn::Result<Option<syn::LitStr>> {
    for attr in attrs {
        if attr.path().is_ident("ber") {
            return attr.parse_args::<syn::LitStr>().map(Some);
        }
    }
    Ok(None)
}

fn is_ident_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Ident"),
        _ => false,
    }
}

/// An expression resolving the field's identifier at runtime: the
/// type's default, with the annotation's directives applied in order.
pub(crate) fn ident_expr(ann: &Annotation, base: TokenStream) -> TokenStream {
    let mut expr = base;
    for directive in &ann.directives {
        expr = match *directive {
            Directive::Replace(id) => ident_value(id),
            Directive::Tag(tag) => quote!(#expr.with_tag(#tag)),
            Directive::Class(class) => {
                let class = class_path(class);
                quote!(#expr.with_class(#class))
            }
            Directive::Form(true) => quote!(#expr.as_constructed()),
            Directive::Form(false) => quote!(#expr.as_primitive()),
        };
    }
    expr
}

fn ident_value(id: ber::Ident) -> TokenStream {
    let class = class_path(id.class());
    let constructed = id.is_constructed();
    let tag = id.tag();
    quote!(::ber::Ident::new(#class, #constructed, #tag))
}

fn class_path(class: TagClass) -> TokenStream {
    match class {
        TagClass::Universal => quote!(::ber::TagClass::Universal),
        TagClass::Application => quote!(::ber::TagClass::Application),
        TagClass::Context => quote!(::ber::TagClass::Context),
        TagClass::Private => quote!(::ber::TagClass::Private),
    }
}
