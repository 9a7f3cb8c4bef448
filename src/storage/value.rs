//! Backend-agnostic statement parameters and result rows.
//!
//! The core never splices values into SQL text. Every value travels to the
//! [`StorageAdapter`](crate::storage::traits::StorageAdapter) as a typed
//! [`SqlValue`] slot, and every result comes back as a [`Row`] of the same
//! type.

use std::fmt;

/// A typed statement parameter or result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// A 64-bit signed integer.
    Integer(i64),
    /// A UTF-8 string.
    Text(String),
}

impl SqlValue {
    /// Returns the integer value, or `None` for `NULL` and text.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text value, or `None` for `NULL` and integers.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One result row, columns in select-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<SqlValue>);

impl Row {
    /// Creates a row from its columns.
    #[must_use]
    pub const fn new(columns: Vec<SqlValue>) -> Self {
        Self(columns)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw column at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&SqlValue> {
        self.0.get(idx)
    }

    /// Returns the column at `idx` as a nullable integer.
    ///
    /// Missing columns and non-integer values read as `None`.
    #[must_use]
    pub fn opt_i64(&self, idx: usize) -> Option<i64> {
        self.get(idx).and_then(SqlValue::as_i64)
    }

    /// Returns the column at `idx` as a nullable string.
    #[must_use]
    pub fn opt_str(&self, idx: usize) -> Option<&str> {
        self.get(idx).and_then(SqlValue::as_str)
    }

    /// Returns the column at `idx` as a required integer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the column is missing or not an integer.
    pub fn i64(&self, idx: usize) -> crate::Result<i64> {
        self.opt_i64(idx).ok_or_else(|| crate::Error::Storage {
            operation: "decode_row".to_string(),
            cause: format!("column {idx} is not an integer: {:?}", self.get(idx)),
        })
    }

    /// Returns the column at `idx` as a required string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the column is missing or not text.
    pub fn str(&self, idx: usize) -> crate::Result<&str> {
        match self.get(idx) {
            Some(SqlValue::Text(s)) => Ok(s),
            other => Err(crate::Error::Storage {
                operation: "decode_row".to_string(),
                cause: format!("column {idx} is not text: {other:?}"),
            }),
        }
    }

    /// Iterates over the columns.
    pub fn iter(&self) -> std::slice::Iter<'_, SqlValue> {
        self.0.iter()
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(columns: Vec<SqlValue>) -> Self {
        Self(columns)
    }
}
