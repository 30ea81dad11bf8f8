//! SQLite dialect.

use super::Dialect;

/// SQLite dialect.
///
/// SQLite accepts backtick-quoted identifiers, so the emitted statements
/// look the same as for MySQL apart from literal escaping.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Compares with the BINARY collation whatever the column declares, so
    /// `NOCASE` columns still differ by case.
    fn null_safe_differs(&self, left: &str, right: &str) -> String {
        format!("({left} IS NOT {right} COLLATE BINARY)")
    }
}
