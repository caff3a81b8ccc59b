//! Value types exchanged with the cursor
//!
//! `SqlValue` is what statements are bound with and what fetched rows hold,
//! `Row` is one fetched row, and `RowId` is the opaque identifier reported
//! after data-modifying statements.

use serde::Serialize;
use std::fmt;

/// Identifier of the physical row a data-modifying statement touched last.
///
/// Opaque to callers: it can be displayed, compared and bound back into a
/// `rowid = ?` predicate, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RowId(i64);

impl RowId {
    pub(crate) fn new(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render an optional identifier, printing `None` when absent
pub fn display_row_id(row_id: Option<RowId>) -> String {
    match row_id {
        Some(id) => id.to_string(),
        None => "None".to_string(),
    }
}

/// A bound parameter or fetched column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Blob(bytes) => {
                write!(f, "x'")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, "'")
            }
        }
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<RowId> for SqlValue {
    fn from(value: RowId) -> Self {
        Self::Integer(value.0)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&SqlValue> for turso::Value {
    fn from(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => turso::Value::Null,
            SqlValue::Integer(i) => turso::Value::Integer(*i),
            SqlValue::Real(r) => turso::Value::Real(*r),
            SqlValue::Text(s) => turso::Value::Text(s.clone()),
            SqlValue::Blob(b) => turso::Value::Blob(b.clone()),
        }
    }
}

impl From<turso::Value> for SqlValue {
    fn from(value: turso::Value) -> Self {
        match value {
            turso::Value::Null => Self::Null,
            turso::Value::Integer(i) => Self::Integer(i),
            turso::Value::Real(r) => Self::Real(r),
            turso::Value::Text(s) => Self::Text(s),
            turso::Value::Blob(b) => Self::Blob(b),
        }
    }
}

/// Build a positional parameter list from anything convertible to `SqlValue`
///
/// ```
/// use rowid_db::{sql_params, SqlValue};
///
/// let params = sql_params![1, "First"];
/// assert_eq!(params, vec![SqlValue::Integer(1), SqlValue::Text("First".into())]);
/// ```
#[macro_export]
macro_rules! sql_params {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::SqlValue::from($value)),+]
    };
}

/// One fetched row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(Vec<SqlValue>);

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    /// Column value by position
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.0
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
