//! Scalar values and rows as read from a table.
//!
//! Every non-null value is kept in the textual form the server produced it
//! in, so two values are equal exactly when their bytes are equal.

use std::fmt;
use std::ops::Deref;

/// A single column value.
///
/// Comparison is byte-for-byte and case sensitive. `Null` is distinct from
/// every string, including the empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// A value whose representation is valid UTF-8.
    Text(String),
    /// A value that is not valid UTF-8 (binary columns).
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Builds a value from the raw bytes returned by a driver.
    ///
    /// `None` is NULL; bytes that are not UTF-8 are kept as [`SqlValue::Bytes`].
    #[must_use]
    pub fn from_raw(raw: Option<Vec<u8>>) -> Self {
        match raw {
            None => Self::Null,
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(err) => Self::Bytes(err.into_bytes()),
            },
        }
    }

    /// Returns true for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a blob literal (`X'..'`), understood by MySQL and SQLite.
    #[must_use]
    pub fn hex_literal(bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
        format!("X'{hex}'")
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&Self::hex_literal(b)),
        }
    }
}

/// One row of a table, values in schema column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row(Vec<SqlValue>);

impl Row {
    /// Creates a row from its values.
    #[must_use]
    pub const fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    /// Consumes the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.0
    }
}

impl Deref for Row {
    type Target = [SqlValue];

    fn deref(&self) -> &[SqlValue] {
        &self.0
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<SqlValue> for Row {
    fn from_iter<I: IntoIterator<Item = SqlValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The values of a row at its primary-key columns.
///
/// Two rows with equal composites are the same logical record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Composite(Vec<SqlValue>);

impl Composite {
    /// Creates a composite from key values, in primary-key order.
    #[must_use]
    pub const fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    /// Returns the key values.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.0
    }

    /// Returns true when the table has no primary key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

/// Builds a [`Row`] from literals; `None` becomes NULL.
///
/// ```
/// use oxide_rowsync_core::{row, SqlValue};
///
/// let r = row!["1", None::<&str>, "x"];
/// assert_eq!(r[1], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::Row::new(vec![$($crate::SqlValue::from($value)),*])
    };
}
