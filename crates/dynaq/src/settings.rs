//! Request-boundary settings.
//!
//! [`Settings`] bundles everything a web layer needs to turn a request into
//! [`QueryOptions`]: where the query text lives, custom operation shortcodes,
//! source-compatibility flags and the pagination policy. Settings load from
//! YAML or JSON:
//!
//! ```
//! use dynaq::{FilterOperation, PaginationBehaviour, RequestParts, Settings};
//!
//! let settings = Settings::from_yaml_str(
//!     r#"
//! op_codes:
//!   is: Equals
//! resolver:
//!   from: query_string
//!   parameter: dq
//! pagination:
//!   max_count: 50
//!   exceeded_behaviour: reject
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.op_codes.get("is"), Some(&FilterOperation::Equals));
//! assert_eq!(settings.pagination.exceeded_behaviour, PaginationBehaviour::Reject);
//!
//! let options = settings
//!     .prepare(&RequestParts::new("dq=o%3Dis%26p%3DName%26v%3DAda"))
//!     .unwrap();
//! assert_eq!(options.filters[0].operator, FilterOperation::Equals);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::op::OpCodes;
use crate::options::{PaginationOption, QueryOptions};
use crate::parse::parse;
use crate::resolver::{QueryResolver, RequestParts};

/// Default ceiling for `count`.
pub const DEFAULT_MAX_COUNT: i64 = 100;

/// What to do when a request asks for more than the maximum page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationBehaviour {
    /// Lower `count` to the maximum.
    #[default]
    Clamp,
    /// Fail with [`QueryError::MaximumResultSetExceeded`].
    Reject,
}

/// Page-size ceiling and data-set count policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
    pub max_count: i64,
    /// Ask the pipeline to capture the post-filter element count.
    pub include_data_set_count: bool,
    pub exceeded_behaviour: PaginationBehaviour,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        PaginationPolicy {
            max_count: DEFAULT_MAX_COUNT,
            include_data_set_count: true,
            exceeded_behaviour: PaginationBehaviour::Clamp,
        }
    }
}

impl PaginationPolicy {
    /// Enforces the policy on parsed options.
    ///
    /// A `count` above the maximum is clamped or rejected; a non-positive
    /// `count` becomes 1 and a negative `offset` becomes 0. Without
    /// pagination, a count-only window is added when the data-set count is
    /// requested.
    pub fn enforce(&self, options: &mut QueryOptions) -> Result<()> {
        let Some(pagination) = options.pagination.as_mut() else {
            if self.include_data_set_count {
                options.pagination = Some(PaginationOption::default().with_data_set_count());
            }
            return Ok(());
        };

        pagination.assign_data_set_count = self.include_data_set_count;
        if pagination.count > self.max_count {
            match self.exceeded_behaviour {
                PaginationBehaviour::Clamp => {
                    log::debug!(
                        "clamping requested count {} to {}",
                        pagination.count,
                        self.max_count
                    );
                    pagination.count = self.max_count;
                }
                PaginationBehaviour::Reject => {
                    return Err(QueryError::MaximumResultSetExceeded {
                        count: pagination.count,
                        max: self.max_count,
                    });
                }
            }
        } else if pagination.count <= 0 {
            pagination.count = 1;
        }

        if pagination.offset < 0 {
            pagination.offset = 0;
        }
        Ok(())
    }
}

/// Request-to-options settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shortcodes consulted after canonical operation names.
    pub op_codes: OpCodes,
    pub uses_case_insensitive_source: bool,
    pub ignore_predefined_orders: bool,
    pub is_null_value_string: bool,
    pub resolver: QueryResolver,
    pub pagination: PaginationPolicy,
}

impl Settings {
    /// Loads settings from YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads settings from JSON.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolves, parses and polices the query of one request.
    pub fn prepare(&self, request: &RequestParts) -> Result<QueryOptions> {
        let text = self.resolver.resolve(request);
        let op_codes = (!self.op_codes.is_empty()).then_some(&self.op_codes);

        let mut options = parse(&text, op_codes)?;
        options.uses_case_insensitive_source = self.uses_case_insensitive_source;
        options.ignore_predefined_orders = self.ignore_predefined_orders;
        options.is_null_value_string = self.is_null_value_string;
        self.pagination.enforce(&mut options)?;
        Ok(options)
    }
}
