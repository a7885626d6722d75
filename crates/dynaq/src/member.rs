//! Member path resolution.
//!
//! A [`MemberPath`] is a dotted property name resolved against a declared
//! record type. Resolution happens once, at compile time; evaluation then
//! walks the runtime [`Value`] along the same segments.

use std::fmt;

use crate::error::CompileError;
use crate::traits::FieldType;
use crate::value::Value;

/// Property name meaning "the element itself".
pub const SELF_SENTINEL: &str = "_";

/// A validated member path and the declared type it leads to.
#[derive(Debug, Clone)]
pub struct MemberPath {
    segments: Vec<String>,
    field_type: FieldType,
    nullable: bool,
}

impl MemberPath {
    /// Resolves `path` against `root`.
    ///
    /// Each dot-separated segment must name a member of the record reached so
    /// far; optional records are looked through. `_` resolves to `root` itself.
    pub fn resolve(root: &FieldType, path: &str) -> Result<MemberPath, CompileError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(CompileError::MissingProperty);
        }
        if path == SELF_SENTINEL {
            return Ok(MemberPath {
                segments: Vec::new(),
                field_type: root.clone(),
                nullable: root.is_optional(),
            });
        }

        let mut segments = Vec::new();
        let mut current = root.clone();
        let mut nullable = false;
        for segment in path.split('.') {
            if !segments.is_empty() {
                nullable |= current.is_optional();
            }
            let next = current
                .member(segment)
                .ok_or_else(|| CompileError::UnknownMember {
                    property: path.to_string(),
                    on: current.name(),
                })?;
            segments.push(segment.to_string());
            current = next;
        }

        nullable |= current.is_optional();
        Ok(MemberPath {
            segments,
            field_type: current,
            nullable,
        })
    }

    /// Declared type of the member.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Returns `true` for the `_` sentinel.
    pub fn is_self(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` when reading the member can yield no value: the member
    /// is optional or an optional record lies on the way to it.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Reads the member from `root`.
    ///
    /// Returns `None` when an intermediate record is absent; an absent final
    /// member is `Some(Value::Null)`.
    pub fn read<'a>(&self, root: &Value<'a>) -> Option<Value<'a>> {
        let Some((last, init)) = self.segments.split_last() else {
            return Some(root.clone());
        };

        let mut current = root.clone();
        for segment in init {
            current = current.member(segment);
            if !matches!(current, Value::Record(_)) {
                return None;
            }
        }
        Some(current.member(last))
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str(SELF_SENTINEL)
        } else {
            f.write_str(&self.segments.join("."))
        }
    }
}
