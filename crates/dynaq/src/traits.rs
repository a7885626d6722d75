//! Member resolution traits.
//!
//! A query is compiled against a record type through two capabilities:
//! looking up the declared type of a member ([`Queryable::field_type`]) and
//! reading its runtime value ([`Queryable::field_value`]). Both are usually
//! generated by `#[derive(Queryable)]`, but can be written by hand.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::value::{Number, Timestamp, Value};

/// Declared-type lookup for the members of one record type.
pub type FieldLookup = fn(&str) -> Option<FieldType>;

/// Declared type of a member, used to resolve paths and coerce literals.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Text.
    String,
    /// Signed integer of any width.
    Int,
    /// Unsigned integer of any width.
    UInt,
    /// Floating point.
    Float,
    /// Boolean.
    Bool,
    /// Point in time.
    Timestamp,
    /// Fieldless enum with its variant name table.
    Enum {
        name: &'static str,
        variants: &'static [(&'static str, i64)],
    },
    /// Nested record type.
    Record {
        name: &'static str,
        fields: FieldLookup,
    },
    /// Collection of elements of the inner type.
    List(Box<FieldType>),
    /// Optional member wrapping the inner type.
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Declared type of a [`Queryable`] record.
    pub fn record<T: Queryable>() -> FieldType {
        FieldType::Record {
            name: short_type_name(std::any::type_name::<T>()),
            fields: T::field_type,
        }
    }

    /// Declared type of a [`QueryEnum`].
    pub fn enumeration<E: QueryEnum>() -> FieldType {
        FieldType::Enum {
            name: short_type_name(std::any::type_name::<E>()),
            variants: E::VARIANTS,
        }
    }

    /// Returns `true` for `Optional` types.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// Returns `true` for strings, optional or not.
    pub fn is_string(&self) -> bool {
        matches!(self.unwrap_optional(), FieldType::String)
    }

    /// Strips any `Optional` wrappers.
    pub fn unwrap_optional(&self) -> &FieldType {
        match self {
            FieldType::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Element type when this is a (possibly optional) collection.
    pub fn element(&self) -> Option<&FieldType> {
        match self.unwrap_optional() {
            FieldType::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Declared type of a member, when this is a (possibly optional) record.
    pub fn member(&self, name: &str) -> Option<FieldType> {
        match self.unwrap_optional() {
            FieldType::Record { fields, .. } => fields(name),
            _ => None,
        }
    }

    /// Returns `true` when values of this type can be ordered.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self.unwrap_optional(),
            FieldType::String
                | FieldType::Int
                | FieldType::UInt
                | FieldType::Float
                | FieldType::Timestamp
                | FieldType::Enum { .. }
                | FieldType::Bool
        )
    }

    /// Human-readable name for diagnostics.
    pub fn name(&self) -> String {
        match self {
            FieldType::String => "string".into(),
            FieldType::Int => "int".into(),
            FieldType::UInt => "uint".into(),
            FieldType::Float => "float".into(),
            FieldType::Bool => "bool".into(),
            FieldType::Timestamp => "timestamp".into(),
            FieldType::Enum { name, .. } => format!("enum {}", name),
            FieldType::Record { name, .. } => format!("record {}", name),
            FieldType::List(inner) => format!("list<{}>", inner.name()),
            FieldType::Optional(inner) => format!("option<{}>", inner.name()),
        }
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// A record type that queries can be compiled against.
///
/// This trait is typically derived using `#[derive(Queryable)]`, but can also
/// be implemented manually:
///
/// ```
/// use dynaq::{FieldType, Number, Queryable, Value};
///
/// struct Task {
///     name: String,
///     priority: u8,
/// }
///
/// impl Queryable for Task {
///     fn field_type(name: &str) -> Option<FieldType> {
///         match name.to_ascii_lowercase().as_str() {
///             "name" => Some(FieldType::String),
///             "priority" => Some(FieldType::UInt),
///             _ => None,
///         }
///     }
///
///     fn field_value(&self, name: &str) -> Value<'_> {
///         match name.to_ascii_lowercase().as_str() {
///             "name" => Value::String(&self.name),
///             "priority" => Value::Number(Number::from(self.priority)),
///             _ => Value::Null,
///         }
///     }
/// }
/// ```
pub trait Queryable {
    /// Returns the declared type of a member, or `None` if the record has no
    /// such member. Member names are matched case-insensitively.
    fn field_type(name: &str) -> Option<FieldType>
    where
        Self: Sized;

    /// Returns the runtime value of a member.
    ///
    /// Unknown members and absent optional members yield [`Value::Null`].
    fn field_value(&self, name: &str) -> Value<'_>;
}

/// A type that can appear as a member of a [`Queryable`] record.
pub trait QueryField {
    /// The declared type of this member type.
    fn declared_type() -> FieldType;

    /// The runtime value of this member.
    fn as_value(&self) -> Value<'_>;
}

/// Helper trait for fieldless enums, derived with `#[derive(QueryEnum)]`.
///
/// Enum members compare and order by their underlying integral
/// representation. Query literals may name a variant (case-insensitively) or
/// give its discriminant.
///
/// ```
/// use dynaq::QueryEnum;
///
/// #[derive(Clone, Copy)]
/// enum Status {
///     Pending,
///     Active,
/// }
///
/// impl QueryEnum for Status {
///     const VARIANTS: &'static [(&'static str, i64)] = &[("Pending", 0), ("Active", 1)];
///
///     fn discriminant(&self) -> i64 {
///         *self as i64
///     }
/// }
///
/// assert_eq!(Status::Active.discriminant(), 1);
/// ```
pub trait QueryEnum {
    /// Variant names paired with their discriminants.
    const VARIANTS: &'static [(&'static str, i64)];

    /// Returns the discriminant of this variant.
    fn discriminant(&self) -> i64;
}

macro_rules! query_field_number {
    ($field_type:ident: $($t:ty),*) => {
        $(
            impl QueryField for $t {
                fn declared_type() -> FieldType {
                    FieldType::$field_type
                }

                fn as_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

query_field_number!(Int: i8, i16, i32, i64, isize);
query_field_number!(UInt: u8, u16, u32, u64, usize);
query_field_number!(Float: f32, f64);

impl QueryField for String {
    fn declared_type() -> FieldType {
        FieldType::String
    }

    fn as_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl QueryField for &str {
    fn declared_type() -> FieldType {
        FieldType::String
    }

    fn as_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl QueryField for bool {
    fn declared_type() -> FieldType {
        FieldType::Bool
    }

    fn as_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl QueryField for Timestamp {
    fn declared_type() -> FieldType {
        FieldType::Timestamp
    }

    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

impl QueryField for DateTime<Utc> {
    fn declared_type() -> FieldType {
        FieldType::Timestamp
    }

    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from(self))
    }
}

impl QueryField for NaiveDateTime {
    fn declared_type() -> FieldType {
        FieldType::Timestamp
    }

    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp(self.and_utc().timestamp_millis()))
    }
}

impl QueryField for NaiveDate {
    fn declared_type() -> FieldType {
        FieldType::Timestamp
    }

    fn as_value(&self) -> Value<'_> {
        match self.and_hms_opt(0, 0, 0) {
            Some(midnight) => Value::Timestamp(Timestamp(midnight.and_utc().timestamp_millis())),
            None => Value::Null,
        }
    }
}

impl<T: QueryField> QueryField for Option<T> {
    fn declared_type() -> FieldType {
        FieldType::Optional(Box::new(T::declared_type()))
    }

    fn as_value(&self) -> Value<'_> {
        self.as_ref().map_or(Value::Null, QueryField::as_value)
    }
}

impl<T: QueryField> QueryField for Vec<T> {
    fn declared_type() -> FieldType {
        FieldType::List(Box::new(T::declared_type()))
    }

    fn as_value(&self) -> Value<'_> {
        Value::List(self.iter().map(QueryField::as_value).collect())
    }
}

impl<T: QueryField> QueryField for Box<T> {
    fn declared_type() -> FieldType {
        T::declared_type()
    }

    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}
