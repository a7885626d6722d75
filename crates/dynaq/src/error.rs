//! Error types for the dynaq crate.

use thiserror::Error;

/// Errors that can occur when parsing, compiling or applying queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed sort token, case-sensitivity modifier, pagination token or
    /// nested sub-query.
    #[error("invalid query: {message} (query: '{query}')")]
    InvalidQuery { message: String, query: String },

    /// Operation, property and value occurrences do not line up.
    #[error(
        "invalid query structure: {operations} operation(s), {properties} property(ies) and {values} value(s) do not form triplets (query: '{query}')"
    )]
    TripletMismatch {
        operations: usize,
        properties: usize,
        values: usize,
        query: String,
    },

    /// Operator token resolves to no known operation or shortcode.
    #[error("operation '{operation}' is not supported (query: '{query}')")]
    OperationNotSupported { operation: String, query: String },

    /// A filter could not be compiled against the record type.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Any failure while applying options to a source, wrapped once with the
    /// originating query text.
    #[error("query could not be applied (query: '{query}'): {source}")]
    Pipeline {
        query: String,
        #[source]
        source: Box<QueryError>,
    },

    /// Requested page size is above the configured maximum.
    #[error("given count {count} exceeds the maximum amount of {max}")]
    MaximumResultSetExceeded { count: i64, max: i64 },

    /// Settings could not be loaded.
    #[error("invalid settings: {0}")]
    Config(String),

    /// A data source failed while counting or executing.
    #[error("data source error: {0}")]
    Source(String),
}

impl QueryError {
    pub(crate) fn invalid(message: impl Into<String>, query: &str) -> Self {
        QueryError::InvalidQuery {
            message: message.into(),
            query: query.to_string(),
        }
    }

    /// The query text this error refers to, when known.
    pub fn query(&self) -> Option<&str> {
        match self {
            QueryError::InvalidQuery { query, .. }
            | QueryError::TripletMismatch { query, .. }
            | QueryError::OperationNotSupported { query, .. }
            | QueryError::Pipeline { query, .. } => Some(query),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for QueryError {
    fn from(err: serde_yaml::Error) -> Self {
        QueryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Config(err.to_string())
    }
}

/// Failures while compiling a filter or sort option against a record type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Empty property name.
    #[error("a property name is required")]
    MissingProperty,

    /// Path segment does not exist on the record type.
    #[error("property '{property}' is not defined on {on}")]
    UnknownMember { property: String, on: String },

    /// Literal could not be converted to the member type.
    #[error("value '{value}' cannot be converted to {expected} for property '{property}'")]
    Coercion {
        property: String,
        value: String,
        expected: String,
    },

    /// `null` tested against a member that cannot be absent.
    #[error("type of property '{property}' is not nullable but query value was received null")]
    NullOnNonOptional { property: String },

    /// Operator cannot be applied to the member type.
    #[error("operator '{operation}' cannot be applied to property '{property}' of type {member_type}")]
    OperatorTypeMismatch {
        operation: String,
        property: String,
        member_type: String,
    },

    /// Collection operator on a member that is not a collection.
    #[error("property '{property}' of type {member_type} is not a collection")]
    NotACollection {
        property: String,
        member_type: String,
    },

    /// Collection operator without a sub-query, or a sub-query without filters.
    #[error("operator '{operation}' on property '{property}' requires a nested query with at least one filter")]
    MissingNestedQuery { operation: String, property: String },

    /// Scalar operator given a nested sub-query instead of a literal.
    #[error("operator '{operation}' on property '{property}' expects a literal value, not a nested query")]
    UnexpectedNestedQuery { operation: String, property: String },
}

/// Result type for dynaq operations.
pub type Result<T> = std::result::Result<T, QueryError>;
