//! Typed field values.
//!
//! # Responsibility
//! - Carry one scalar between untyped params, model fields and SQLite.
//! - Convert into the concrete Rust types model setters expect.
//!
//! # Invariants
//! - Only scalars are representable; arrays/objects/floats/blobs are rejected.
//! - Booleans are persisted as `0`/`1` integers.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One scalar column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
}

/// A value did not have the shape a field expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTypeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Display for ValueTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl Error for ValueTypeError {}

impl FieldValue {
    /// Converts one params entry into a field value.
    pub fn from_json(value: &JsonValue) -> Result<Self, ValueTypeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(flag) => Ok(Self::Bool(*flag)),
            JsonValue::String(text) => Ok(Self::Text(text.clone())),
            JsonValue::Number(number) => number.as_i64().map(Self::Integer).ok_or(ValueTypeError {
                expected: "scalar",
                found: "float",
            }),
            JsonValue::Array(_) => Err(ValueTypeError {
                expected: "scalar",
                found: "array",
            }),
            JsonValue::Object(_) => Err(ValueTypeError {
                expected: "scalar",
                found: "object",
            }),
        }
    }

    /// Converts one stored SQLite cell into a field value.
    pub fn from_sql(value: ValueRef<'_>) -> Result<Self, ValueTypeError> {
        match value {
            ValueRef::Null => Ok(Self::Null),
            ValueRef::Integer(number) => Ok(Self::Integer(number)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|text| Self::Text(text.to_string()))
                .map_err(|_| ValueTypeError {
                    expected: "utf-8 text",
                    found: "invalid utf-8",
                }),
            ValueRef::Real(_) => Err(ValueTypeError {
                expected: "scalar",
                found: "real",
            }),
            ValueRef::Blob(_) => Err(ValueTypeError {
                expected: "scalar",
                found: "blob",
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_i64(self) -> Result<i64, ValueTypeError> {
        match self {
            Self::Integer(number) => Ok(number),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_opt_i64(self) -> Result<Option<i64>, ValueTypeError> {
        match self {
            Self::Null => Ok(None),
            Self::Integer(number) => Ok(Some(number)),
            other => Err(other.mismatch("integer or null")),
        }
    }

    /// Accepts `true`/`false` and the stored `0`/`1` encoding.
    pub fn into_bool(self) -> Result<bool, ValueTypeError> {
        match self {
            Self::Bool(flag) => Ok(flag),
            Self::Integer(0) => Ok(false),
            Self::Integer(1) => Ok(true),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn into_string(self) -> Result<String, ValueTypeError> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(other.mismatch("text")),
        }
    }

    pub fn into_opt_string(self) -> Result<Option<String>, ValueTypeError> {
        match self {
            Self::Null => Ok(None),
            Self::Text(text) => Ok(Some(text)),
            other => Err(other.mismatch("text or null")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueTypeError {
        ValueTypeError {
            expected,
            found: self.kind(),
        }
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Integer)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<&Option<String>> for FieldValue {
    fn from(value: &Option<String>) -> Self {
        value.clone().into()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(number) => ToSqlOutput::Owned(Value::Integer(*number)),
            Self::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Self::Bool(flag) => ToSqlOutput::Owned(Value::Integer(i64::from(*flag))),
        })
    }
}
