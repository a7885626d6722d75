//! Predicate compiler.
//!
//! Each [`Filter`] compiles to an [`Expr`] node against the declared type of
//! the record; filters then fold left to right into one [`Predicate`], each
//! joined to the running result by its own logical operator. The result is an
//! inspectable tree: it can be evaluated in memory or walked by a remote
//! executor, and it prints in a compact expression syntax.
//!
//! ```
//! use dynaq::{Filter, FilterOperation, LogicalOperator, Predicate, QueryOptions, Queryable};
//!
//! #[derive(Queryable)]
//! struct Row {
//!     a: i32,
//!     b: i32,
//!     c: i32,
//! }
//!
//! let options = QueryOptions::new()
//!     .filter(Filter::new("a", FilterOperation::Equals, "1"))
//!     .filter(Filter::new("b", FilterOperation::Equals, "2").joined_by(LogicalOperator::OrElse))
//!     .filter(Filter::new("c", FilterOperation::Equals, "3"));
//!
//! let predicate = Predicate::compile::<Row>(&options).unwrap().unwrap();
//! assert_eq!(predicate.to_string(), "((a == 1 || b == 2) && c == 3)");
//! assert!(predicate.matches(&Row { a: 9, b: 2, c: 3 }));
//! assert!(!predicate.matches(&Row { a: 1, b: 2, c: 0 }));
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::coerce::{coerce, Constant};
use crate::error::CompileError;
use crate::member::MemberPath;
use crate::op::{FilterOperation, LogicalOperator};
use crate::options::{Filter, QueryOptions};
use crate::ordering::{collate, collate_ignore_case, compare_values};
use crate::traits::{FieldType, Queryable};
use crate::value::Value;

/// Delimiter between the values of an `In`/`NotIn` literal.
pub const IN_DELIMITER: char = ',';

/// Binary comparison of a member against a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn from_operation(op: FilterOperation) -> Option<CompareOp> {
        match op {
            FilterOperation::Equals => Some(CompareOp::Eq),
            FilterOperation::NotEqual => Some(CompareOp::Ne),
            FilterOperation::LessThan => Some(CompareOp::Lt),
            FilterOperation::LessThanOrEqual => Some(CompareOp::Le),
            FilterOperation::GreaterThan => Some(CompareOp::Gt),
            FilterOperation::GreaterThanOrEqual => Some(CompareOp::Ge),
            _ => None,
        }
    }

    /// Evaluates the comparison given a three-way ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Substring test on a string member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMethod {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringMethod {
    fn test(self, haystack: &str, needle: &str) -> bool {
        match self {
            StringMethod::Contains => haystack.contains(needle),
            StringMethod::StartsWith => haystack.starts_with(needle),
            StringMethod::EndsWith => haystack.ends_with(needle),
        }
    }

    fn name(self) -> &'static str {
        match self {
            StringMethod::Contains => "contains",
            StringMethod::StartsWith => "starts_with",
            StringMethod::EndsWith => "ends_with",
        }
    }
}

/// Quantifier over a collection member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

/// Compiled boolean expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `member <op> constant`; `fold` lowercases a string member first.
    Compare {
        member: MemberPath,
        op: CompareOp,
        constant: Constant,
        fold: bool,
    },
    /// `member.method(argument)` on a string member.
    Method {
        member: MemberPath,
        method: StringMethod,
        argument: String,
        fold: bool,
    },
    /// Existential or universal test over the elements of a collection.
    Quantified {
        member: MemberPath,
        quantifier: Quantifier,
        body: Box<Expr>,
    },
    /// Two expressions joined by a logical operator.
    Binary {
        op: LogicalOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluates the expression against `root`.
    pub fn evaluate(&self, root: &Value<'_>) -> bool {
        match self {
            Expr::Compare {
                member,
                op,
                constant,
                fold,
            } => match member.read(root) {
                Some(value) => compare(&value, *op, constant, *fold),
                None => false,
            },
            Expr::Method {
                member,
                method,
                argument,
                fold,
            } => match member.read(root) {
                Some(Value::String(s)) if *fold => method.test(&s.to_lowercase(), argument),
                Some(Value::String(s)) => method.test(s, argument),
                _ => false,
            },
            Expr::Quantified {
                member,
                quantifier,
                body,
            } => match member.read(root) {
                Some(Value::List(items)) => match quantifier {
                    Quantifier::Any => items.iter().any(|item| body.evaluate(item)),
                    Quantifier::All => items.iter().all(|item| body.evaluate(item)),
                },
                _ => false,
            },
            Expr::Binary { op, left, right } => {
                op.combine(left.evaluate(root), || right.evaluate(root))
            }
            Expr::Not(inner) => !inner.evaluate(root),
        }
    }
}

fn compare(value: &Value<'_>, op: CompareOp, constant: &Constant, fold: bool) -> bool {
    if constant.is_null() {
        return match op {
            CompareOp::Eq => value.is_null(),
            CompareOp::Ne => !value.is_null(),
            _ => false,
        };
    }

    match (value, constant) {
        (Value::Null, _) => false,
        (Value::String(s), Constant::String(c)) => match op {
            CompareOp::Eq if fold => s.to_lowercase() == *c,
            CompareOp::Ne if fold => s.to_lowercase() != *c,
            CompareOp::Eq => *s == c.as_str(),
            CompareOp::Ne => *s != c.as_str(),
            _ if fold => op.eval_ordering(collate_ignore_case(s, c)),
            _ => op.eval_ordering(collate(s, c)),
        },
        _ => compare_values(value, &constant.as_value(), false)
            .is_some_and(|ordering| op.eval_ordering(ordering)),
    }
}

fn logical_symbol(op: LogicalOperator) -> &'static str {
    match op {
        LogicalOperator::AndAlso => "&&",
        LogicalOperator::OrElse => "||",
        LogicalOperator::And => "&",
        LogicalOperator::Or => "|",
        LogicalOperator::Xor => "^",
    }
}

const FOLD_SUFFIX: &str = ".to_lowercase()";

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare {
                member,
                op,
                constant,
                fold,
            } => {
                let suffix = if *fold { FOLD_SUFFIX } else { "" };
                write!(f, "{}{} {} {}", member, suffix, op.symbol(), constant)
            }
            Expr::Method {
                member,
                method,
                argument,
                fold,
            } => {
                let suffix = if *fold { FOLD_SUFFIX } else { "" };
                write!(f, "{}{}.{}({:?})", member, suffix, method.name(), argument)
            }
            Expr::Quantified {
                member,
                quantifier,
                body,
            } => {
                let name = match quantifier {
                    Quantifier::Any => "any",
                    Quantifier::All => "all",
                };
                write!(f, "{}.{}({})", member, name, body)
            }
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, logical_symbol(*op), right)
            }
            Expr::Not(inner) => match inner.as_ref() {
                Expr::Binary { .. } => write!(f, "!{}", inner),
                _ => write!(f, "!({})", inner),
            },
        }
    }
}

/// Flags that influence how filters compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileContext {
    /// The source already compares strings case-insensitively.
    pub case_insensitive_source: bool,
    /// `null` is the string "null" on string members.
    pub null_is_string: bool,
}

impl From<&QueryOptions> for CompileContext {
    fn from(options: &QueryOptions) -> Self {
        CompileContext {
            case_insensitive_source: options.uses_case_insensitive_source,
            null_is_string: options.is_null_value_string,
        }
    }
}

/// Compiles one filter against the record type `root`.
pub fn compile_filter(
    filter: &Filter,
    root: &FieldType,
    ctx: CompileContext,
) -> Result<Expr, CompileError> {
    let member = MemberPath::resolve(root, &filter.property_name)?;
    let operation = filter.operator;
    let property = filter.property_name.as_str();
    let field_type = member.field_type().clone();

    if operation.is_collection() {
        let Some(element) = field_type.element() else {
            return Err(CompileError::NotACollection {
                property: property.to_string(),
                member_type: field_type.name(),
            });
        };
        let missing = || CompileError::MissingNestedQuery {
            operation: operation.to_string(),
            property: property.to_string(),
        };
        let nested = filter.value.as_nested().ok_or_else(missing)?;
        let first = nested.filters.first().ok_or_else(missing)?;
        if nested.filters.len() > 1 {
            log::warn!(
                "{} on '{}': only the first of {} nested filters is applied",
                operation,
                property,
                nested.filters.len()
            );
        }

        let body = compile_filter(first, element, ctx)?;
        let quantifier = if operation == FilterOperation::Any {
            Quantifier::Any
        } else {
            Quantifier::All
        };
        return Ok(Expr::Quantified {
            member,
            quantifier,
            body: Box::new(body),
        });
    }

    let Some(literal) = filter.value.as_literal() else {
        return Err(CompileError::UnexpectedNestedQuery {
            operation: operation.to_string(),
            property: property.to_string(),
        });
    };

    let mismatch = || CompileError::OperatorTypeMismatch {
        operation: operation.to_string(),
        property: property.to_string(),
        member_type: field_type.name(),
    };
    if matches!(
        field_type.unwrap_optional(),
        FieldType::Record { .. } | FieldType::List(_)
    ) {
        return Err(mismatch());
    }

    let fold = field_type.is_string() && (ctx.case_insensitive_source || !filter.case_sensitive);
    let comparison = |op: CompareOp, text: &str| -> Result<Expr, CompileError> {
        let mut constant = coerce(text, &field_type, property, ctx.null_is_string)?;
        if let (true, Constant::String(s)) = (fold, &mut constant) {
            *s = s.to_lowercase();
        }
        Ok(Expr::Compare {
            member: member.clone(),
            op,
            constant,
            fold,
        })
    };

    match operation {
        FilterOperation::In | FilterOperation::NotIn => {
            let mut parts = literal.split(IN_DELIMITER);
            let first = comparison(CompareOp::Eq, parts.next().unwrap_or_default())?;
            let group = parts.try_fold(first, |group, part| {
                Ok::<_, CompileError>(Expr::Binary {
                    op: LogicalOperator::OrElse,
                    left: Box::new(group),
                    right: Box::new(comparison(CompareOp::Eq, part)?),
                })
            })?;
            if operation != FilterOperation::NotIn {
                return Ok(group);
            }
            let negated = Expr::Not(Box::new(group));
            if !member.is_nullable() {
                return Ok(negated);
            }
            // an absent value matches no non-null comparison, negated or not
            Ok(Expr::Binary {
                op: LogicalOperator::AndAlso,
                left: Box::new(Expr::Compare {
                    member: member.clone(),
                    op: CompareOp::Ne,
                    constant: Constant::Null,
                    fold: false,
                }),
                right: Box::new(negated),
            })
        }
        FilterOperation::Contains | FilterOperation::StartsWith | FilterOperation::EndsWith => {
            if !field_type.is_string() {
                return Err(mismatch());
            }
            let method = match operation {
                FilterOperation::Contains => StringMethod::Contains,
                FilterOperation::StartsWith => StringMethod::StartsWith,
                _ => StringMethod::EndsWith,
            };
            Ok(Expr::Method {
                member: member.clone(),
                method,
                argument: if fold {
                    literal.to_lowercase()
                } else {
                    literal.to_string()
                },
                fold,
            })
        }
        scalar => {
            let op = CompareOp::from_operation(scalar).ok_or_else(mismatch)?;
            if scalar.is_relational()
                && (!field_type.is_ordered()
                    || matches!(field_type.unwrap_optional(), FieldType::Bool))
            {
                return Err(mismatch());
            }
            comparison(op, literal)
        }
    }
}

/// Folds compiled filters left to right.
///
/// Returns `None` for an empty filter list: no predicate, not a predicate
/// that rejects everything.
pub fn compile_filters(
    filters: &[Filter],
    root: &FieldType,
    ctx: CompileContext,
) -> Result<Option<Expr>, CompileError> {
    let Some((first, rest)) = filters.split_first() else {
        return Ok(None);
    };

    let mut expr = compile_filter(first, root, ctx)?;
    for filter in rest {
        let right = compile_filter(filter, root, ctx)?;
        expr = Expr::Binary {
            op: filter.logical_operator,
            left: Box::new(expr),
            right: Box::new(right),
        };
    }
    Ok(Some(expr))
}

/// Compiled predicate over the records of one type.
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Wraps an expression.
    pub fn new(expr: Expr) -> Self {
        Predicate { expr }
    }

    /// Compiles the filters of `options` against `T`.
    pub fn compile<T: Queryable>(options: &QueryOptions) -> Result<Option<Predicate>, CompileError> {
        Predicate::compile_for(&FieldType::record::<T>(), options)
    }

    /// Compiles the filters of `options` against a declared record type.
    pub fn compile_for(
        root: &FieldType,
        options: &QueryOptions,
    ) -> Result<Option<Predicate>, CompileError> {
        let predicate = compile_filters(&options.filters, root, options.into())?.map(Predicate::new);
        if let Some(predicate) = &predicate {
            log::debug!("compiled predicate: {}", predicate);
        }
        Ok(predicate)
    }

    /// The expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Tests one record.
    pub fn matches<T: Queryable>(&self, item: &T) -> bool {
        self.evaluate(&Value::Record(item))
    }

    /// Tests a runtime value.
    pub fn evaluate(&self, value: &Value<'_>) -> bool {
        self.expr.evaluate(value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}
