//! `#[derive(Countable)]` for fieldless enums used as operator IDs or
//! small tag types, mirroring `oxidd_derive::Countable`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(Countable)]
pub fn derive_countable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return syn::Error::new_spanned(&input, "Countable can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    for v in variants {
        if !matches!(v.fields, Fields::Unit) {
            return syn::Error::new_spanned(v, "Countable requires fieldless (unit) variants")
                .to_compile_error()
                .into();
        }
    }

    let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let max_value = idents.len().saturating_sub(1);

    let as_usize_arms = idents.iter().enumerate().map(|(i, ident)| {
        quote! { #name::#ident => #i, }
    });
    let from_usize_arms = idents.iter().enumerate().map(|(i, ident)| {
        quote! { #i => #name::#ident, }
    });

    let expanded = quote! {
        impl addd_core::Countable for #name {
            const MAX_VALUE: usize = #max_value;

            #[inline]
            fn as_usize(self) -> usize {
                match self {
                    #(#as_usize_arms)*
                }
            }

            #[inline]
            fn from_usize(idx: usize) -> Self {
                match idx {
                    #(#from_usize_arms)*
                    _ => panic!("Countable::from_usize: index {} out of range", idx),
                }
            }
        }
    };

    expanded.into()
}
