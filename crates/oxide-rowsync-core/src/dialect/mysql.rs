//! MySQL / MariaDB dialect.

use super::Dialect;

/// MySQL dialect.
///
/// String literals are escaped the way `mysql_real_escape_string` does it.
/// Replaying the output on a server running with `NO_BACKSLASH_ESCAPES`
/// is not supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn escape_string(&self, value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\0' => escaped.push_str("\\0"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '"' => escaped.push_str("\\\""),
                '\x1a' => escaped.push_str("\\Z"),
                _ => escaped.push(c),
            }
        }
        escaped
    }

    fn null_safe_differs(&self, left: &str, right: &str) -> String {
        // BINARY keeps the comparison byte-exact regardless of collation.
        format!("(NOT BINARY {left} <=> {right})")
    }
}
