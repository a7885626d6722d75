//! Query options AST.
//!
//! [`QueryOptions`] is what [`parse`](crate::parse) produces and what
//! [`apply`](crate::apply) consumes. It can also be built directly:
//!
//! ```
//! use dynaq::{Dir, Filter, FilterOperation, QueryOptions, SortOption};
//!
//! let options = QueryOptions::new()
//!     .filter(Filter::new("Name", FilterOperation::StartsWith, "ad"))
//!     .sort(SortOption::new("Age", Dir::Desc))
//!     .paginate(0, 10);
//!
//! assert_eq!(options.filters.len(), 1);
//! assert_eq!(options.pagination.as_ref().map(|p| p.count), Some(10));
//! ```

use serde::{Deserialize, Serialize};

use crate::op::{FilterOperation, LogicalOperator};
use crate::ordering::Dir;

/// Value slot of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Literal text, coerced to the member type at compile time.
    Literal(String),
    /// Sub-query for the `Any`/`All` collection operators.
    Nested(Box<QueryOptions>),
}

impl FilterValue {
    /// Returns the literal text, if this is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            FilterValue::Literal(text) => Some(text),
            FilterValue::Nested(_) => None,
        }
    }

    /// Returns the nested options, if this is a sub-query.
    pub fn as_nested(&self) -> Option<&QueryOptions> {
        match self {
            FilterValue::Literal(_) => None,
            FilterValue::Nested(options) => Some(options),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Literal(text.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        FilterValue::Literal(text)
    }
}

impl From<QueryOptions> for FilterValue {
    fn from(options: QueryOptions) -> Self {
        FilterValue::Nested(Box::new(options))
    }
}

/// A single filter predicate.
///
/// `logical_operator` joins this filter to the accumulated result of every
/// filter before it; it is ignored on the first filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Member path; dots navigate nested records, `_` is the element itself.
    pub property_name: String,
    /// Literal or nested sub-query.
    pub value: FilterValue,
    /// Comparison operator.
    pub operator: FilterOperation,
    /// Demand case-sensitive string comparison.
    #[serde(default)]
    pub case_sensitive: bool,
    /// How this filter joins the filters before it.
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl Filter {
    /// Creates a case-insensitive filter joined with `AndAlso`.
    pub fn new(
        property_name: impl Into<String>,
        operator: FilterOperation,
        value: impl Into<FilterValue>,
    ) -> Self {
        Filter {
            property_name: property_name.into(),
            value: value.into(),
            operator,
            case_sensitive: false,
            logical_operator: LogicalOperator::default(),
        }
    }

    /// Marks the filter case-sensitive.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Sets how this filter joins the filters before it.
    pub fn joined_by(mut self, logical_operator: LogicalOperator) -> Self {
        self.logical_operator = logical_operator;
        self
    }
}

/// A single ordering request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    /// Member path to order by.
    pub property_name: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: Dir,
    /// Compare strings case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl SortOption {
    /// Creates a case-insensitive sort option.
    pub fn new(property_name: impl Into<String>, direction: Dir) -> Self {
        SortOption {
            property_name: property_name.into(),
            direction,
            case_sensitive: false,
        }
    }

    /// Marks the sort option case-sensitive.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }
}

/// Windowing request.
///
/// `data_set_count` is output-only: the pipeline writes the post-filter,
/// pre-windowing element count into it when `assign_data_set_count` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOption {
    /// Maximum number of elements to take; ignored unless positive.
    pub count: i64,
    /// Number of elements to skip; ignored unless positive.
    pub offset: i64,
    /// Total element count after filtering.
    #[serde(default)]
    pub data_set_count: usize,
    /// Capture `data_set_count` while applying.
    #[serde(skip)]
    pub assign_data_set_count: bool,
}

impl PaginationOption {
    /// Creates a window of `count` elements starting at `offset`.
    pub fn new(offset: i64, count: i64) -> Self {
        PaginationOption {
            count,
            offset,
            ..PaginationOption::default()
        }
    }

    /// Requests `data_set_count` capture.
    pub fn with_data_set_count(mut self) -> Self {
        self.assign_data_set_count = true;
        self
    }
}

/// Filters, orderings and pagination for one query.
///
/// Order of `filters` is the fold order and order of `sort_options` the
/// tie-break order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub filters: Vec<Filter>,
    pub sort_options: Vec<SortOption>,
    pub pagination: Option<PaginationOption>,
    /// The data source already compares strings case-insensitively.
    pub uses_case_insensitive_source: bool,
    /// Replace any ordering already present on the source instead of
    /// appending to it.
    pub ignore_predefined_orders: bool,
    /// Treat the literal `null` as the string "null" rather than absence.
    pub is_null_value_string: bool,
    /// Query text these options were parsed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl QueryOptions {
    /// Creates empty options: no predicate, no ordering, no window.
    pub fn new() -> Self {
        QueryOptions::default()
    }

    /// Appends a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Appends a sort option.
    pub fn sort(mut self, sort: SortOption) -> Self {
        self.sort_options.push(sort);
        self
    }

    /// Sets the pagination window.
    pub fn paginate(mut self, offset: i64, count: i64) -> Self {
        self.pagination = Some(PaginationOption::new(offset, count));
        self
    }

    /// Sets whether the source compares strings case-insensitively.
    pub fn case_insensitive_source(mut self, yes: bool) -> Self {
        self.uses_case_insensitive_source = yes;
        self
    }

    /// Sets whether pre-existing orderings are replaced.
    pub fn ignoring_predefined_orders(mut self, yes: bool) -> Self {
        self.ignore_predefined_orders = yes;
        self
    }

    /// Returns `true` when there is nothing to filter, order or window.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sort_options.is_empty() && self.pagination.is_none()
    }

    /// The query text for diagnostics; empty when built directly.
    pub fn query_text(&self) -> &str {
        self.source_text.as_deref().unwrap_or_default()
    }
}
