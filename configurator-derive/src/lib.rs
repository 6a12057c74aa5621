//! `#[derive(Configurable)]` for the `configurator` crate.
//!
//! Field attributes:
//!
//! - `#[configurator(key = "value", ...)]`: each pair becomes a tag on the
//!   field (`flag`, `env`, `default`, `file_json`, `validate`, or any key a
//!   custom provider reads).
//! - `#[configurator(nested)]`: the field is a struct (or `Option` of one)
//!   that is walked recursively instead of being filled directly.
//! - `#[configurator(skip)]`: the field is never visited.
//!
//! Fields without `pub` visibility are not visited either.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, Type, Visibility, parse_macro_input};

#[proc_macro_derive(Configurable, attributes(configurator))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    tags: Vec<(String, String)>,
    nested: bool,
    skip: bool,
}

fn parse_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("configurator") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                attrs.nested = true;
                return Ok(());
            }
            if meta.path.is_ident("skip") {
                attrs.skip = true;
                return Ok(());
            }
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected a tag key"))?
                .unraw()
                .to_string();
            let value: LitStr = meta.value()?.parse()?;
            if attrs.tags.iter().any(|(existing, _)| *existing == key) {
                return Err(meta.error(format!("duplicate tag `{key}`")));
            }
            attrs.tags.push((key, value.value()));
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Configurable can only be derived for structs",
        ));
    };
    let fields = match &data.fields {
        Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Configurable requires a struct with named fields",
            ));
        }
    };

    let mut visits = Vec::new();
    for field in fields {
        let attrs = parse_attrs(field)?;
        if attrs.skip || matches!(field.vis, Visibility::Inherited) {
            continue;
        }
        let Some(ident) = &field.ident else { continue };
        let name = ident.unraw().to_string();
        let keys = attrs.tags.iter().map(|(key, _)| key);
        let values = attrs.tags.iter().map(|(_, value)| value);
        let descriptor = quote! {
            ::configurator::FieldDescriptor::new(
                #name,
                ::configurator::Tags::new(&[#((#keys, #values)),*]),
            )
        };

        let visit = if attrs.nested && is_option(&field.ty) {
            quote! { visitor.visit_optional_struct(&#descriptor, &mut self.#ident)?; }
        } else if attrs.nested {
            quote! { visitor.visit_struct(&#descriptor, &mut self.#ident)?; }
        } else {
            quote! {
                visitor.visit_leaf(&#descriptor, ::configurator::Field::location(&mut self.#ident))?;
            }
        };
        visits.push(visit);
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::configurator::Configurable for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn visit_fields<__V: ::configurator::Visitor>(
                &mut self,
                visitor: &mut __V,
            ) -> ::core::result::Result<(), __V::Error> {
                #(#visits)*
                ::core::result::Result::Ok(())
            }
        }
    })
}
