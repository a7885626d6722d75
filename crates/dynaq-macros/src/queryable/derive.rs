//! Implementation of the `#[derive(Queryable)]` and `#[derive(QueryEnum)]`
//! macros.
//!
//! `Queryable` generates the member table of a record: a declared-type lookup
//! and a value accessor, both matching member names case-insensitively, plus
//! member name constants. Member types are resolved through `QueryField`, so
//! any field whose type implements it (scalars, chrono types, `Option`, `Vec`,
//! `Box`, other derived records and enums) participates without annotations.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::parse_query_attrs;

/// Main implementation of the Queryable derive macro.
pub fn queryable_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Queryable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Queryable can only be derived for structs",
            ))
        }
    };

    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut type_arms: Vec<TokenStream> = Vec::new();
    let mut value_arms: Vec<TokenStream> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let query_attrs = parse_query_attrs(&field.attrs)?;
        if query_attrs.skip {
            continue;
        }

        let query_name = query_attrs
            .rename
            .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string());

        if seen.iter().any(|name| name.eq_ignore_ascii_case(&query_name)) {
            return Err(Error::new(
                field.span(),
                format!(
                    "member name '{}' is used more than once (names are case-insensitive)",
                    query_name
                ),
            ));
        }
        seen.push(query_name.clone());

        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));
        field_constants.push(quote! {
            /// Member name constant for building queries.
            pub const #const_name: &'static str = #query_name;
        });

        let ty = &field.ty;
        type_arms.push(quote! {
            if name.eq_ignore_ascii_case(#query_name) {
                return ::core::option::Option::Some(
                    <#ty as ::dynaq::QueryField>::declared_type(),
                );
            }
        });
        value_arms.push(quote! {
            if name.eq_ignore_ascii_case(#query_name) {
                return ::dynaq::QueryField::as_value(&self.#field_name);
            }
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::dynaq::Queryable for #struct_name #ty_generics #where_clause {
            fn field_type(name: &str) -> ::core::option::Option<::dynaq::FieldType> {
                #(#type_arms)*
                ::core::option::Option::None
            }

            fn field_value(&self, name: &str) -> ::dynaq::Value<'_> {
                #(#value_arms)*
                ::dynaq::Value::Null
            }
        }

        impl #impl_generics ::dynaq::QueryField for #struct_name #ty_generics #where_clause {
            fn declared_type() -> ::dynaq::FieldType {
                ::dynaq::FieldType::record::<Self>()
            }

            fn as_value(&self) -> ::dynaq::Value<'_> {
                ::dynaq::Value::Record(self)
            }
        }
    };

    Ok(expanded)
}

/// Main implementation of the QueryEnum derive macro.
///
/// Variants are exposed under their identifiers (or `#[query(rename)]`) with
/// their integral discriminants.
pub fn query_enum_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let enum_name = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(Error::new(
                input.span(),
                "QueryEnum can only be derived for enums",
            ))
        }
    };

    if variants.is_empty() {
        return Err(Error::new(
            input.span(),
            "QueryEnum requires at least one variant",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "QueryEnum cannot be derived for generic enums",
        ));
    }

    let mut table: Vec<TokenStream> = Vec::new();
    let mut arms: Vec<TokenStream> = Vec::new();

    for variant in variants.iter() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new(
                variant.span(),
                "QueryEnum can only be derived for fieldless enums",
            ));
        }

        let query_attrs = parse_query_attrs(&variant.attrs)?;
        let ident = &variant.ident;
        let query_name = query_attrs.rename.unwrap_or_else(|| ident.to_string());

        arms.push(quote! {
            #enum_name::#ident => #enum_name::#ident as i64,
        });
        if !query_attrs.skip {
            table.push(quote! {
                (#query_name, #enum_name::#ident as i64),
            });
        }
    }

    let expanded = quote! {
        impl ::dynaq::QueryEnum for #enum_name {
            const VARIANTS: &'static [(&'static str, i64)] = &[
                #(#table)*
            ];

            fn discriminant(&self) -> i64 {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::dynaq::QueryField for #enum_name {
            fn declared_type() -> ::dynaq::FieldType {
                ::dynaq::FieldType::enumeration::<Self>()
            }

            fn as_value(&self) -> ::dynaq::Value<'_> {
                ::dynaq::Value::Enum(::dynaq::QueryEnum::discriminant(self))
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_lowercase();
        }
    }

    result
}
