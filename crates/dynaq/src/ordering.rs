//! Ordering types for sort stages.
//!
//! Provides [`Dir`] for sort direction, [`SortKey`] for a compiled sort step,
//! and the string collations used by both sorting and relational filters.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::member::MemberPath;
use crate::options::SortOption;
use crate::traits::{FieldType, Queryable};
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc`, ignoring case.
    pub fn from_name(name: &str) -> Option<Dir> {
        if name.eq_ignore_ascii_case("asc") {
            Some(Dir::Asc)
        } else if name.eq_ignore_ascii_case("desc") {
            Some(Dir::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Culture-style string collation.
///
/// Letters compare case-insensitively first; only exact ties on that key are
/// broken by case, with lowercase ahead of uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    primary
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Case-insensitive string comparison on lowercase forms.
pub fn collate_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compares two values of the same type.
///
/// Strings use [`collate_ignore_case`] when `ignore_case` is set and
/// [`collate`] otherwise. Returns `None` if the types don't match or
/// comparison is not possible (NaN).
pub fn compare_values(a: &Value<'_>, b: &Value<'_>, ignore_case: bool) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) if ignore_case => Some(collate_ignore_case(a, b)),
        (Value::String(a), Value::String(b)) => Some(collate(a, b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        // Null values sort last
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Greater),
        (_, Value::Null) => Some(Ordering::Less),

        _ => None,
    }
}

/// A compiled sort step: a resolved member, a direction and a comparer.
#[derive(Debug, Clone)]
pub struct SortKey {
    member: MemberPath,
    dir: Dir,
    ignore_case: bool,
}

impl SortKey {
    /// Compiles a sort option against a record type.
    ///
    /// String members get the case-insensitive comparer unless the option is
    /// case-sensitive and the source does not already ignore case.
    pub fn compile(
        root: &FieldType,
        sort: &SortOption,
        case_insensitive_source: bool,
    ) -> Result<SortKey, CompileError> {
        let member = MemberPath::resolve(root, &sort.property_name)?;
        let field_type = member.field_type();
        if !field_type.is_ordered() {
            return Err(CompileError::OperatorTypeMismatch {
                operation: "OrderBy".into(),
                property: sort.property_name.clone(),
                member_type: field_type.name(),
            });
        }
        let ignore_case =
            field_type.is_string() && (case_insensitive_source || !sort.case_sensitive);

        Ok(SortKey {
            member,
            dir: sort.direction,
            ignore_case,
        })
    }

    /// Case-sensitive sort key on a member of `T`.
    ///
    /// ```
    /// use dynaq::{Dir, FieldType, Number, Queryable, SortKey, Value};
    ///
    /// struct Row(i64);
    ///
    /// impl Queryable for Row {
    ///     fn field_type(name: &str) -> Option<FieldType> {
    ///         (name == "n").then_some(FieldType::Int)
    ///     }
    ///     fn field_value(&self, _: &str) -> Value<'_> {
    ///         Value::Number(Number::I64(self.0))
    ///     }
    /// }
    ///
    /// let key = SortKey::on::<Row>("n", Dir::Desc).unwrap();
    /// assert_eq!(key.to_string(), "n desc");
    /// ```
    pub fn on<T: Queryable>(property: &str, dir: Dir) -> Result<SortKey, CompileError> {
        let mut sort = SortOption::new(property, dir);
        sort.case_sensitive = true;
        SortKey::compile(&FieldType::record::<T>(), &sort, false)
    }

    /// The resolved member.
    pub fn member(&self) -> &MemberPath {
        &self.member
    }

    /// The sort direction.
    pub fn dir(&self) -> Dir {
        self.dir
    }

    /// Whether strings compare case-insensitively.
    pub fn ignores_case(&self) -> bool {
        self.ignore_case
    }

    /// Compares two elements according to this key.
    ///
    /// Elements whose member cannot be compared are treated as equal.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        let left = self.member.read(a).unwrap_or(Value::Null);
        let right = self.member.read(b).unwrap_or(Value::Null);
        compare_values(&left, &right, self.ignore_case)
            .map(|ordering| self.dir.apply(ordering))
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.member, self.dir)?;
        if self.ignore_case {
            f.write_str(" ignore-case")?;
        }
        Ok(())
    }
}

/// Compares two elements using a list of sort keys.
///
/// Uses the first key as the primary sort key, the second to break ties, etc.
/// If all keys compare equal, returns `Equal`.
pub fn compare_by_keys(a: &Value<'_>, b: &Value<'_>, keys: &[&SortKey]) -> Ordering {
    for key in keys {
        let ordering = key.compare(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
