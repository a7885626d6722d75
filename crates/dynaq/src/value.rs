//! Runtime value types for member access.
//!
//! The [`Value`] enum represents the runtime value of a member extracted from a
//! record. Records are navigated through [`Value::Record`], collections through
//! [`Value::List`], and absent optional members are [`Value::Null`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::traits::Queryable;

/// Runtime value of a member, borrowed from the source record.
///
/// # Example
///
/// ```
/// use dynaq::{Number, Value};
///
/// let name = String::from("Ada");
/// let v = Value::String(&name);
/// assert_eq!(v.as_str(), Some("Ada"));
/// assert_eq!(Value::Number(Number::I64(3)).as_number(), Some(Number::I64(3)));
/// ```
#[derive(Clone)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Enum value, as its underlying integral discriminant.
    Enum(i64),
    /// Boolean value.
    Bool(bool),
    /// Nested record, navigated by dotted member paths.
    Record(&'a dyn Queryable),
    /// Collection of element values, the target of `Any`/`All`.
    List(Vec<Value<'a>>),
    /// Optional member with no value present, or an unknown member.
    Null,
}

impl<'a> Value<'a> {
    /// Returns `true` if no value is present.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the enum discriminant, if present.
    pub fn as_enum(&self) -> Option<i64> {
        match self {
            Value::Enum(d) => Some(*d),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Reads a member of a record value. Non-records yield [`Value::Null`].
    pub fn member(&self, name: &str) -> Value<'a> {
        match self {
            Value::Record(record) => {
                let record: &'a dyn Queryable = *record;
                record.field_value(name)
            }
            _ => Value::Null,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
            Value::Enum(d) => f.debug_tuple("Enum").field(d).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Record(_) => f.write_str("Record(..)"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Null => f.write_str("Null"),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.compare(*b) == Some(Ordering::Equal),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => std::ptr::addr_eq(*a, *b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Mixed integer comparisons are exact; any comparison involving a float
/// converts to `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

macro_rules! number_from {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64, i64: i8, i16, i32, i64, isize);
number_from!(U64, u64: u8, u16, u32, u64, usize);
number_from!(F64, f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// ```
/// use dynaq::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses a timestamp literal.
    ///
    /// Accepts integer milliseconds, RFC 3339 text, or a `YYYY-MM-DD` date
    /// (midnight UTC).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(millis) = text.parse::<i64>() {
            return Some(Timestamp(millis));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        Some(Timestamp(Utc.from_utc_datetime(&midnight).timestamp_millis()))
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl<Tz: TimeZone> From<&DateTime<Tz>> for Timestamp {
    fn from(dt: &DateTime<Tz>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}
