//! Query text resolvers.
//!
//! Decide where in a request the query text lives: the whole query string, one
//! named query parameter, or a header. An optional decode function can undo a
//! custom encoding (base64, say) before the text reaches the parser.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexer;

/// Custom decoding applied to the resolved text.
pub type DecodeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Framework-agnostic view of the parts of a request a resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParts {
    /// Raw query string, with or without the leading `?`.
    pub query: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
}

impl RequestParts {
    /// Request with the given raw query string and no headers.
    pub fn new(query: impl Into<String>) -> Self {
        RequestParts {
            query: query.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.strip_prefix('?').unwrap_or(&self.query);
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (lexer::decode(key, false) == name).then(|| lexer::decode(value, false))
        })
    }
}

/// Where the query text is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ResolveFrom {
    /// The whole query string, or the value of one query parameter.
    QueryString {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter: Option<String>,
    },
    /// The first value of a header.
    Header { name: String },
}

impl Default for ResolveFrom {
    fn default() -> Self {
        ResolveFrom::QueryString { parameter: None }
    }
}

/// Resolves the raw query text from a request.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct QueryResolver {
    #[serde(flatten)]
    pub from: ResolveFrom,
    #[serde(skip)]
    decode: Option<DecodeFn>,
}

impl QueryResolver {
    /// Reads the whole query string.
    pub fn query_string() -> Self {
        QueryResolver::default()
    }

    /// Reads the value of one query parameter.
    pub fn query_parameter(name: impl Into<String>) -> Self {
        QueryResolver {
            from: ResolveFrom::QueryString {
                parameter: Some(name.into()),
            },
            decode: None,
        }
    }

    /// Reads the first value of a header.
    pub fn header(name: impl Into<String>) -> Self {
        QueryResolver {
            from: ResolveFrom::Header { name: name.into() },
            decode: None,
        }
    }

    /// Applies `decode` to the resolved text.
    pub fn with_decoder<F>(mut self, decode: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.decode = Some(Arc::new(decode));
        self
    }

    /// Resolves the query text; a missing parameter or header is empty text.
    pub fn resolve(&self, request: &RequestParts) -> String {
        let raw = match &self.from {
            ResolveFrom::QueryString { parameter: None } => request.query.clone(),
            ResolveFrom::QueryString {
                parameter: Some(name),
            } => request.query_param(name).unwrap_or_default(),
            ResolveFrom::Header { name } => {
                request.header_value(name).unwrap_or_default().to_string()
            }
        };

        match &self.decode {
            Some(decode) => decode(&raw),
            None => raw,
        }
    }
}

impl fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResolver")
            .field("from", &self.from)
            .field("decode", &self.decode.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
