//! `#[derive(WalkAst)]`: generates `crate::walk::Walk` for syntax tree nodes by
//! walking every field in declaration order.

use proc_macro::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields, Index};

#[proc_macro_derive(WalkAst)]
pub fn derive_walk_ast(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let body = match walk_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl<'ast> crate::walk::Walk<'ast> for #name {
            #[inline(always)]
            fn walk<V: crate::walk::Visitor<'ast> + ?Sized>(
                &'ast self,
                a: &'ast crate::ast::AstArena,
                v: &mut V
            ) {
                #body
            }
        }
    };

    expanded.into()
}

fn walk_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(s) => {
            let calls = s.fields.iter().enumerate().map(|(i, field)| {
                let access = match &field.ident {
                    Some(ident) => quote! { &self.#ident },
                    None => {
                        let index = Index::from(i);
                        quote! { &self.#index }
                    }
                };
                walk_call(access)
            });
            Ok(quote! { #(#calls)* })
        }
        Data::Enum(e) => {
            let arms = e.variants.iter().map(|variant| variant_arm(&variant.ident, &variant.fields));
            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "WalkAst cannot be derived for unions",
        )),
    }
}

fn walk_call(binding: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    quote! { crate::walk::Walk::walk(#binding, a, v); }
}

fn variant_arm(variant: &syn::Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Unit => quote! { Self::#variant => {} },
        Fields::Named(named) => {
            let bindings: Vec<_> = named.named.iter().filter_map(|f| f.ident.clone()).collect();
            let calls = bindings.iter().map(|b| walk_call(quote! { #b }));
            quote! {
                Self::#variant { #(#bindings),* } => { #(#calls)* }
            }
        }
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let calls = bindings.iter().map(|b| walk_call(quote! { #b }));
            quote! {
                Self::#variant(#(#bindings),*) => { #(#calls)* }
            }
        }
    }
}
