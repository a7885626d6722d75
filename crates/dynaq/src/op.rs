//! Operator catalog.
//!
//! [`FilterOperation`] enumerates every comparison a filter can request and
//! [`LogicalOperator`] how a filter joins the filters before it. Operation
//! tokens resolve by name first, then through a caller-supplied shortcode
//! table, then through [`DEFAULT_OP_CODES`].

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Comparison operator of a filter.
///
/// Scalar operators come first; the collection operators start at 100 so a
/// single threshold comparison tells the two families apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterOperation {
    /// Member is one of a comma-separated list of values.
    In = 0,
    /// Equal.
    Equals = 1,
    /// Less than.
    LessThan = 2,
    /// String contains substring.
    Contains = 3,
    /// Not equal.
    NotEqual = 4,
    /// String ends with suffix.
    EndsWith = 5,
    /// String starts with prefix.
    StartsWith = 6,
    /// Greater than.
    GreaterThan = 7,
    /// Less than or equal.
    LessThanOrEqual = 8,
    /// Greater than or equal.
    GreaterThanOrEqual = 9,
    /// Member is none of a comma-separated list of values.
    NotIn = 10,

    // Collection operators
    /// At least one element of a collection matches the nested query.
    Any = 100,
    /// Every element of a collection matches the nested query.
    All = 101,
}

impl FilterOperation {
    /// Every operation, in declaration order.
    pub const ALL: [FilterOperation; 13] = [
        FilterOperation::In,
        FilterOperation::Equals,
        FilterOperation::LessThan,
        FilterOperation::Contains,
        FilterOperation::NotEqual,
        FilterOperation::EndsWith,
        FilterOperation::StartsWith,
        FilterOperation::GreaterThan,
        FilterOperation::LessThanOrEqual,
        FilterOperation::GreaterThanOrEqual,
        FilterOperation::NotIn,
        FilterOperation::Any,
        FilterOperation::All,
    ];

    /// Returns `true` for `Any` and `All`.
    pub fn is_collection(self) -> bool {
        self as u8 >= FilterOperation::Any as u8
    }

    /// Returns `true` for the relational operators.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            FilterOperation::GreaterThan
                | FilterOperation::GreaterThanOrEqual
                | FilterOperation::LessThan
                | FilterOperation::LessThanOrEqual
        )
    }

    /// The canonical operation name, as accepted in `o=` tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperation::In => "In",
            FilterOperation::Equals => "Equals",
            FilterOperation::LessThan => "LessThan",
            FilterOperation::Contains => "Contains",
            FilterOperation::NotEqual => "NotEqual",
            FilterOperation::EndsWith => "EndsWith",
            FilterOperation::StartsWith => "StartsWith",
            FilterOperation::GreaterThan => "GreaterThan",
            FilterOperation::LessThanOrEqual => "LessThanOrEqual",
            FilterOperation::GreaterThanOrEqual => "GreaterThanOrEqual",
            FilterOperation::NotIn => "NotIn",
            FilterOperation::Any => "Any",
            FilterOperation::All => "All",
        }
    }

    /// Looks an operation up by its canonical name, ignoring case.
    pub fn from_name(name: &str) -> Option<FilterOperation> {
        FilterOperation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    /// Resolves an operation token.
    ///
    /// The canonical name wins, then `custom` shortcodes, then
    /// [`DEFAULT_OP_CODES`].
    pub fn resolve(token: &str, custom: Option<&OpCodes>) -> Option<FilterOperation> {
        if token.is_empty() {
            return None;
        }
        FilterOperation::from_name(token)
            .or_else(|| custom.and_then(|codes| lookup_code(codes, token)))
            .or_else(|| lookup_code(&DEFAULT_OP_CODES, token))
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortcode table mapping tokens to operations.
pub type OpCodes = HashMap<String, FilterOperation>;

/// Built-in shortcodes, shared read-only by every parse.
pub static DEFAULT_OP_CODES: Lazy<OpCodes> = Lazy::new(|| {
    [
        ("eq", FilterOperation::Equals),
        ("ne", FilterOperation::NotEqual),
        ("lt", FilterOperation::LessThan),
        ("ltoe", FilterOperation::LessThanOrEqual),
        ("gt", FilterOperation::GreaterThan),
        ("gtoe", FilterOperation::GreaterThanOrEqual),
        ("cts", FilterOperation::Contains),
        ("sw", FilterOperation::StartsWith),
        ("ew", FilterOperation::EndsWith),
        ("in", FilterOperation::In),
        ("nin", FilterOperation::NotIn),
        ("any", FilterOperation::Any),
        ("all", FilterOperation::All),
    ]
    .into_iter()
    .map(|(code, op)| (code.to_string(), op))
    .collect()
});

fn lookup_code(codes: &OpCodes, token: &str) -> Option<FilterOperation> {
    codes.get(token).copied().or_else(|| {
        codes
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(token))
            .map(|(_, op)| *op)
    })
}

/// How a filter combines with the accumulated result of the filters before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// Short-circuiting AND.
    #[default]
    AndAlso,
    /// Short-circuiting OR.
    OrElse,
    /// Non-short-circuiting AND.
    And,
    /// Non-short-circuiting OR.
    Or,
    /// Exclusive OR.
    Xor,
}

impl LogicalOperator {
    /// Every logical operator.
    pub const ALL: [LogicalOperator; 5] = [
        LogicalOperator::AndAlso,
        LogicalOperator::OrElse,
        LogicalOperator::And,
        LogicalOperator::Or,
        LogicalOperator::Xor,
    ];

    /// The canonical name, as accepted after `|` in `o=` tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::AndAlso => "AndAlso",
            LogicalOperator::OrElse => "OrElse",
            LogicalOperator::And => "And",
            LogicalOperator::Or => "Or",
            LogicalOperator::Xor => "Xor",
        }
    }

    /// Looks a logical operator up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<LogicalOperator> {
        LogicalOperator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    /// Combines the running result with the next filter's result.
    ///
    /// The short-circuiting variants skip `right` when `left` decides.
    pub fn combine(self, left: bool, right: impl FnOnce() -> bool) -> bool {
        match self {
            LogicalOperator::AndAlso => left && right(),
            LogicalOperator::OrElse => left || right(),
            LogicalOperator::And => {
                let right = right();
                left & right
            }
            LogicalOperator::Or => {
                let right = right();
                left | right
            }
            LogicalOperator::Xor => left ^ right(),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
