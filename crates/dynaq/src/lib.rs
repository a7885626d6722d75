//! Dynaq - query-string filter, sort and pagination compiler.
//!
//! Dynaq turns a compact textual mini-language into a query plan (a predicate,
//! an ordering and a window) that can be applied to any sequence of typed
//! records. It supports:
//!
//! - Equality, relational and string-matching filters with per-filter case
//!   sensitivity
//! - Set membership (`In`/`NotIn`) and `Any`/`All` sub-queries over
//!   collection members
//! - Left-to-right logical folding with `AndAlso`, `OrElse`, `And`, `Or`, `Xor`
//! - Ordering that splices behind any ordering already present on the source
//! - Offset/count windowing with optional total-count capture
//!
//! # Quick Start
//!
//! ```rust
//! use dynaq::{apply, parse, Query, Queryable};
//!
//! #[derive(Queryable)]
//! struct Task {
//!     name: String,
//!     priority: i32,
//!     archived: bool,
//! }
//!
//! let tasks = vec![
//!     Task { name: "Write docs".into(), priority: 3, archived: false },
//!     Task { name: "Fix bug".into(), priority: 5, archived: false },
//!     Task { name: "Old task".into(), priority: 1, archived: true },
//! ];
//!
//! let mut options = parse(
//!     "o=gtoe&p=priority&v=3&o=eq&p=archived&v=false&s=priority,desc",
//!     None,
//! )
//! .unwrap();
//!
//! let results = apply(Query::new(&tasks), Some(&mut options)).unwrap().to_vec();
//! assert_eq!(results.len(), 2);
//! assert_eq!(results[0].name, "Fix bug");
//! ```
//!
//! # Query Grammar
//!
//! ```text
//! o=<Operator>[|<LogicalOperator>]&p=<Property>[,cs]&v=<Value|(<nested-query>)>
//! s=<Property>[,<Asc|Desc>[,cs]]
//! offset=<int>&count=<int>
//! ```
//!
//! `o`, `p` and `v` occurrences are positional and must come in equal numbers.
//! Each filter joins the result of every filter before it with its own
//! logical operator, so `[F1, F2|OrElse, F3]` means `(F1 || F2) && F3`.
//!
//! # Operators
//!
//! | Operation | Shortcode | Member types |
//! |-----------|-----------|--------------|
//! | `Equals`, `NotEqual` | `eq`, `ne` | all scalars |
//! | `LessThan`, `LessThanOrEqual` | `lt`, `ltoe` | ordered scalars |
//! | `GreaterThan`, `GreaterThanOrEqual` | `gt`, `gtoe` | ordered scalars |
//! | `Contains`, `StartsWith`, `EndsWith` | `cts`, `sw`, `ew` | strings |
//! | `In`, `NotIn` | `in`, `nin` | all scalars |
//! | `Any`, `All` | `any`, `all` | collections |

extern crate self as dynaq;

mod coerce;
mod error;
mod lexer;
mod member;
mod op;
mod options;
mod ordering;
mod parse;
mod pipeline;
mod plan;
mod predicate;
mod resolver;
mod settings;
mod source;
mod traits;
mod value;

// Re-export public API
pub use coerce::{coerce, Constant, NULL_LITERAL};
pub use error::{CompileError, QueryError, Result};
pub use member::{MemberPath, SELF_SENTINEL};
pub use op::{FilterOperation, LogicalOperator, OpCodes, DEFAULT_OP_CODES};
pub use options::{Filter, FilterValue, PaginationOption, QueryOptions, SortOption};
pub use ordering::{collate, collate_ignore_case, compare_values, Dir, SortKey};
pub use parse::parse;
pub use pipeline::apply;
pub use plan::{Plan, Stage};
pub use predicate::{
    compile_filter, compile_filters, CompareOp, CompileContext, Expr, Predicate, Quantifier,
    StringMethod,
};
pub use resolver::{DecodeFn, QueryResolver, RequestParts, ResolveFrom};
pub use settings::{PaginationBehaviour, PaginationPolicy, Settings, DEFAULT_MAX_COUNT};
pub use source::{Query, QuerySource};
pub use traits::{FieldLookup, FieldType, QueryEnum, QueryField, Queryable};
pub use value::{Number, Timestamp, Value};

#[cfg(feature = "derive")]
pub use dynaq_macros::{QueryEnum, Queryable};
