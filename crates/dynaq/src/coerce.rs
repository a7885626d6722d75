//! Literal coercion.
//!
//! Turns the literal text of a filter into a typed [`Constant`] of the
//! member's declared type.

use std::fmt;

use crate::error::CompileError;
use crate::traits::FieldType;
use crate::value::{Number, Timestamp, Value};

/// Literal meaning "no value present".
pub const NULL_LITERAL: &str = "null";

/// Owned, typed comparison constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Number(Number),
    Timestamp(Timestamp),
    Enum(i64),
    Bool(bool),
    /// No value present.
    Null,
}

impl Constant {
    /// Borrows the constant as a runtime value.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Constant::String(s) => Value::String(s),
            Constant::Number(n) => Value::Number(*n),
            Constant::Timestamp(t) => Value::Timestamp(*t),
            Constant::Enum(d) => Value::Enum(*d),
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Null => Value::Null,
        }
    }

    /// Returns `true` for [`Constant::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) => write!(f, "{:?}", s),
            Constant::Number(n) => write!(f, "{}", n),
            Constant::Timestamp(t) => write!(f, "{}", t),
            Constant::Enum(d) => write!(f, "{}", d),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Null => f.write_str(NULL_LITERAL),
        }
    }
}

/// Converts `literal` to a constant of `field_type`.
///
/// `null` becomes [`Constant::Null`] unless `null_is_string` is set and the
/// member is a string; null against a non-optional member is an error.
pub fn coerce(
    literal: &str,
    field_type: &FieldType,
    property: &str,
    null_is_string: bool,
) -> Result<Constant, CompileError> {
    let null_literal = literal == NULL_LITERAL && !(null_is_string && field_type.is_string());
    if null_literal {
        return if field_type.is_optional() {
            Ok(Constant::Null)
        } else {
            Err(CompileError::NullOnNonOptional {
                property: property.to_string(),
            })
        };
    }

    let fail = || CompileError::Coercion {
        property: property.to_string(),
        value: literal.to_string(),
        expected: field_type.unwrap_optional().name(),
    };
    let trimmed = literal.trim();

    match field_type.unwrap_optional() {
        FieldType::String => Ok(Constant::String(literal.to_string())),
        FieldType::Int => trimmed
            .parse::<i64>()
            .map(|n| Constant::Number(Number::I64(n)))
            .map_err(|_| fail()),
        FieldType::UInt => trimmed
            .parse::<u64>()
            .map(|n| Constant::Number(Number::U64(n)))
            .map_err(|_| fail()),
        FieldType::Float => trimmed
            .parse::<f64>()
            .map(|n| Constant::Number(Number::F64(n)))
            .map_err(|_| fail()),
        FieldType::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Constant::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Constant::Bool(false))
            } else {
                Err(fail())
            }
        }
        FieldType::Timestamp => Timestamp::parse(trimmed)
            .map(Constant::Timestamp)
            .ok_or_else(fail),
        FieldType::Enum { variants, .. } => variants
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, discriminant)| *discriminant)
            .or_else(|| trimmed.parse::<i64>().ok())
            .map(Constant::Enum)
            .ok_or_else(fail),
        FieldType::Record { .. } | FieldType::List(_) | FieldType::Optional(_) => Err(fail()),
    }
}
