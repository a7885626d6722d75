//! Implementation of the `#[derive(Queryable)]` and `#[derive(QueryEnum)]`
//! macros.

mod attrs;
mod derive;

pub use derive::{query_enum_derive_impl, queryable_derive_impl};
