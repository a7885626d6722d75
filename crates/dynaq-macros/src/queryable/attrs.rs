//! Attribute parsing for the `#[query(...)]` field and variant attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Attributes from `#[query(...)]`.
#[derive(Debug, Clone)]
pub struct QueryAttr {
    /// Leave this member out of the record's member table.
    pub skip: bool,
    /// Member name used by queries (default: the Rust identifier).
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for QueryAttr {
    fn default() -> Self {
        QueryAttr {
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for QueryAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = QueryAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => {
                    attr.skip = true;
                    attr.span = p.span();
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    };
                    if s.value().is_empty() {
                        return Err(Error::new(s.span(), "rename must not be empty"));
                    }
                    attr.rename = Some(s.value());
                    attr.span = s.span();
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown query attribute. Expected: skip or rename = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extracts `#[query(...)]` from a list of attributes.
pub fn parse_query_attrs(attrs: &[Attribute]) -> Result<QueryAttr> {
    for attr in attrs {
        if attr.path().is_ident("query") {
            return attr.parse_args::<QueryAttr>();
        }
    }
    Ok(QueryAttr::default())
}
