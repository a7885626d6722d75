//! Query text parser.
//!
//! ```text
//! o=<Operator>[|<LogicalOperator>]&p=<Property>[,cs]&v=<Value|(<nested-query>)>   (repeatable, positional)
//! s=<Property>[,<Asc|Desc>[,cs]]                                                 (repeatable)
//! offset=<int>&count=<int>                                                      (both required together)
//! ```
//!
//! Parsing is all-or-nothing: any structural problem fails the whole parse.

use crate::error::{QueryError, Result};
use crate::lexer::{self, Lexed, RawValue};
use crate::op::{FilterOperation, LogicalOperator, OpCodes};
use crate::options::{Filter, FilterValue, PaginationOption, QueryOptions, SortOption};
use crate::ordering::Dir;

/// Separates a property or sort name from its modifiers.
pub const OPTION_DELIMITER: char = ',';
/// Separates an operation from its logical operator.
pub const LOGICAL_DELIMITER: char = '|';
/// Case-sensitivity modifier.
pub const CASE_SENSITIVE_MODIFIER: &str = "cs";

/// Parses query text into [`QueryOptions`].
///
/// Operation tokens resolve by canonical name first, then through `op_codes`,
/// then through the built-in shortcodes.
///
/// ```
/// use dynaq::{parse, Dir, FilterOperation, LogicalOperator};
///
/// let options = parse("o=eq&p=Name,cs&v=Ada&o=Equals|OrElse&p=Age&v=36&s=Age,desc", None).unwrap();
///
/// assert_eq!(options.filters[0].operator, FilterOperation::Equals);
/// assert!(options.filters[0].case_sensitive);
/// assert_eq!(options.filters[1].logical_operator, LogicalOperator::OrElse);
/// assert_eq!(options.sort_options[0].direction, Dir::Desc);
/// assert!(options.pagination.is_none());
/// ```
pub fn parse(query: &str, op_codes: Option<&OpCodes>) -> Result<QueryOptions> {
    let options = parse_text(query, op_codes, false)?;
    log::debug!(
        "parsed query '{}': {} filter(s), {} sort option(s), pagination: {}",
        query,
        options.filters.len(),
        options.sort_options.len(),
        options.pagination.is_some()
    );
    Ok(options)
}

fn parse_text(query: &str, op_codes: Option<&OpCodes>, decoded: bool) -> Result<QueryOptions> {
    let text = query.strip_prefix('?').unwrap_or(query);
    if text.trim().is_empty() {
        return Ok(QueryOptions::default());
    }

    let (text, decoded) = if !decoded && lexer::is_fully_encoded(text) {
        (lexer::decode(text, false), true)
    } else {
        (text.to_string(), decoded)
    };

    let lexed = lexer::lex(&text, decoded);
    let mut options = QueryOptions {
        source_text: Some(query.to_string()),
        ..QueryOptions::default()
    };

    options.filters = parse_filters(&lexed, query, op_codes)?;
    options.sort_options = parse_sorts(&lexed.sorts, query)?;
    options.pagination = parse_pagination(&lexed, query)?;
    Ok(options)
}

fn parse_filters(lexed: &Lexed, query: &str, op_codes: Option<&OpCodes>) -> Result<Vec<Filter>> {
    let (operations, properties, values) = (&lexed.operations, &lexed.properties, &lexed.values);
    if operations.len() != properties.len() || properties.len() != values.len() {
        return Err(QueryError::TripletMismatch {
            operations: operations.len(),
            properties: properties.len(),
            values: values.len(),
            query: query.to_string(),
        });
    }

    operations
        .iter()
        .zip(properties)
        .zip(values)
        .map(|((operation, property), value)| {
            let (operator, logical_operator) = parse_operation(operation, query, op_codes)?;
            let (property_name, case_sensitive) = parse_property(property, query)?;
            let value = parse_value(value, operator, query, op_codes)?;
            Ok(Filter {
                property_name,
                value,
                operator,
                case_sensitive,
                logical_operator,
            })
        })
        .collect()
}

fn parse_operation(
    token: &str,
    query: &str,
    op_codes: Option<&OpCodes>,
) -> Result<(FilterOperation, LogicalOperator)> {
    let (name, logical) = match token.split_once(LOGICAL_DELIMITER) {
        Some((name, suffix)) => {
            let logical = LogicalOperator::from_name(suffix).ok_or_else(|| {
                QueryError::invalid(format!("invalid logical operator '{}'", suffix), query)
            })?;
            (name, logical)
        }
        None => (token, LogicalOperator::default()),
    };

    let operation =
        FilterOperation::resolve(name, op_codes).ok_or_else(|| QueryError::OperationNotSupported {
            operation: name.to_string(),
            query: query.to_string(),
        })?;
    Ok((operation, logical))
}

fn parse_property(token: &str, query: &str) -> Result<(String, bool)> {
    let mut parts = token.split(OPTION_DELIMITER);
    let name = parts.next().unwrap_or_default().to_string();
    let modifiers: Vec<&str> = parts.collect();

    match modifiers.as_slice() {
        [] => Ok((name, false)),
        [modifier] if modifier.eq_ignore_ascii_case(CASE_SENSITIVE_MODIFIER) => Ok((name, true)),
        _ => Err(QueryError::invalid(
            format!(
                "invalid extra option provided for filter property '{}'. Received value was '{}'",
                name,
                modifiers.join(",")
            ),
            query,
        )),
    }
}

fn parse_value(
    value: &RawValue,
    operator: FilterOperation,
    query: &str,
    op_codes: Option<&OpCodes>,
) -> Result<FilterValue> {
    match (value, operator.is_collection()) {
        (
            RawValue::Group {
                inner, decoded, ..
            },
            true,
        ) => {
            let nested = parse_text(inner, op_codes, *decoded)?;
            Ok(FilterValue::Nested(Box::new(nested)))
        }
        (RawValue::Group { literal, .. }, false) => Ok(FilterValue::Literal(literal.clone())),
        (RawValue::Literal(_), true) => Err(QueryError::invalid(
            format!("operation '{}' requires a nested query value", operator),
            query,
        )),
        (RawValue::Literal(text), false) => Ok(FilterValue::Literal(text.clone())),
        (RawValue::Malformed(message), _) => Err(QueryError::invalid(*message, query)),
    }
}

fn parse_sorts(tokens: &[String], query: &str) -> Result<Vec<SortOption>> {
    tokens
        .iter()
        .filter(|token| !token.is_empty())
        .map(|token| {
            let parts: Vec<&str> = token.split(OPTION_DELIMITER).collect();
            let (name, direction, modifier) = match parts.as_slice() {
                [name] => (*name, None, None),
                [name, direction] => (*name, Some(*direction), None),
                [name, direction, modifier] => (*name, Some(*direction), Some(*modifier)),
                _ => {
                    return Err(QueryError::invalid(
                        format!("sort option '{}' is malformed", token),
                        query,
                    ))
                }
            };

            let direction = match direction {
                Some(text) => Dir::from_name(text).ok_or_else(|| {
                    QueryError::invalid(format!("invalid sorting direction '{}'", text), query)
                })?,
                None => Dir::Asc,
            };
            let case_sensitive = match modifier {
                Some(m) if m.eq_ignore_ascii_case(CASE_SENSITIVE_MODIFIER) => true,
                Some(m) => {
                    return Err(QueryError::invalid(
                        format!(
                            "invalid extra option provided for sort property '{}'. Received value was '{}'",
                            name, m
                        ),
                        query,
                    ))
                }
                None => false,
            };

            Ok(SortOption {
                property_name: name.to_string(),
                direction,
                case_sensitive,
            })
        })
        .collect()
}

fn parse_pagination(lexed: &Lexed, query: &str) -> Result<Option<PaginationOption>> {
    let (offsets, counts) = (&lexed.offsets, &lexed.counts);
    if offsets.is_empty() || counts.is_empty() || offsets.len() != counts.len() {
        return Ok(None);
    }

    // only the first occurrence of each counts
    match (offsets[0].parse::<i64>(), counts[0].parse::<i64>()) {
        (Ok(offset), Ok(count)) => Ok(Some(PaginationOption::new(offset, count))),
        _ => Err(QueryError::invalid("invalid pagination options", query)),
    }
}
