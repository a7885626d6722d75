//! Derive macros for dynaq.
//!
//! - [`Queryable`] - Generate the member table of a record type
//! - [`QueryEnum`] - Expose a fieldless enum's variant names and discriminants
//!
//! Both are re-exported from `dynaq` under the default `derive` feature.

mod queryable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Queryable` and `QueryField` for a struct with named fields.
///
/// Every field takes part in queries unless marked `#[query(skip)]`. A
/// field's declared type comes from its `QueryField` implementation, so
/// nested records, fieldless enums, `Option`, `Vec` and `Box` wrappers work
/// without annotations.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | Use a custom member name in queries |
///
/// # Generated Code
///
/// 1. Member name constants (e.g., `Person::NAME`, `Person::CREATED_AT`)
/// 2. `Queryable::field_type()` and `Queryable::field_value()`, matching
///    member names case-insensitively
/// 3. `QueryField` for the struct itself, so it can be nested in other records
///
/// # Example
///
/// ```ignore
/// use dynaq::{Filter, FilterOperation, Predicate, QueryOptions, Queryable};
///
/// #[derive(Queryable)]
/// struct Person {
///     name: String,
///     age: Option<u32>,
///     #[query(rename = "Mail")]
///     email: String,
///     #[query(skip)]
///     password_hash: String,
/// }
///
/// let options = QueryOptions::new()
///     .filter(Filter::new(Person::NAME, FilterOperation::StartsWith, "Ad"));
/// let predicate = Predicate::compile::<Person>(&options)?;
/// ```
#[proc_macro_derive(Queryable, attributes(query))]
pub fn queryable_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    queryable::queryable_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `QueryEnum` and `QueryField` for a fieldless enum.
///
/// Query literals may name a variant (case-insensitively) or give its
/// discriminant. `#[query(rename = "...")]` changes the accepted name and
/// `#[query(skip)]` hides a variant from name lookup.
///
/// ```ignore
/// use dynaq::QueryEnum;
///
/// #[derive(QueryEnum)]
/// enum Status {
///     Pending,
///     Active = 10,
/// }
///
/// assert_eq!(Status::Active.discriminant(), 10);
/// ```
#[proc_macro_derive(QueryEnum, attributes(query))]
pub fn query_enum_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    queryable::query_enum_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
