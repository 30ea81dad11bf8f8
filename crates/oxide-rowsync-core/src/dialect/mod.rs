//! SQL dialect support.
//!
//! A dialect is the single point where literals are escaped and where the
//! null-safe comparison used by the remote diff is spelled out.

mod mysql;
mod sqlite;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;

use crate::value::SqlValue;

/// Trait for SQL dialect-specific rendering.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '`'
    }

    /// Quotes a column name.
    ///
    /// Names are wrapped, not escaped: they come from schema discovery.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Escapes the contents of a string literal (without the quotes).
    fn escape_string(&self, value: &str) -> String;

    /// Renders a value so it can be embedded in SQL text.
    fn quote_value(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Text(s) => format!("'{}'", self.escape_string(s)),
            SqlValue::Bytes(b) => SqlValue::hex_literal(b),
        }
    }

    /// Renders a predicate that holds when the two operands differ, treating
    /// two NULLs as equal.
    fn null_safe_differs(&self, left: &str, right: &str) -> String;
}
