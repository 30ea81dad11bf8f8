//! INSERT, UPDATE and DELETE statements addressed to the target table.
//!
//! Builders return `None` instead of a statement whenever a clause would be
//! empty. A `DELETE` or `UPDATE` without a `WHERE` clause is never built.

use std::fmt;

use crate::render::{Renderer, COMMA};
use crate::value::{Composite, SqlValue};

/// Kind of row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    /// Row missing from the target.
    Insert,
    /// Row present on both sides with different values.
    Update,
    /// Row missing from the source.
    Delete,
}

impl StatementKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rendered mutation.
///
/// `Display` renders the SQL terminated by `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    key: Composite,
    sql: String,
}

impl Statement {
    /// The kind of mutation.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Primary-key composite of the addressed row.
    #[must_use]
    pub const fn key(&self) -> &Composite {
        &self.key
    }

    /// SQL text without the terminating `;`.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};", self.sql)
    }
}

/// Builds statements against one target table.
#[derive(Clone, Copy)]
pub struct StatementBuilder<'a> {
    renderer: Renderer<'a>,
    table: &'a str,
}

impl<'a> StatementBuilder<'a> {
    /// Creates a builder. The table name is emitted verbatim.
    #[must_use]
    pub const fn new(renderer: Renderer<'a>, table: &'a str) -> Self {
        Self { renderer, table }
    }

    /// Returns the target table name.
    #[must_use]
    pub const fn table(&self) -> &'a str {
        self.table
    }

    /// Returns the renderer used for clauses.
    #[must_use]
    pub const fn renderer(&self) -> Renderer<'a> {
        self.renderer
    }

    fn statement(&self, kind: StatementKind, row: &[SqlValue], sql: String) -> Statement {
        Statement {
            kind,
            key: self.renderer.metadata().extract_key(row),
            sql,
        }
    }

    fn push_where(&self, sql: &mut String, row: &[SqlValue]) -> bool {
        sql.push_str(" WHERE ");
        self.renderer.key_match_list(sql, row)
    }

    /// `INSERT INTO <table> (<all columns>) VALUES (<all values>)`.
    #[must_use]
    pub fn insert(&self, row: &[SqlValue]) -> Option<Statement> {
        let metadata = self.renderer.metadata();
        let mut sql = format!("INSERT INTO {} (", self.table);
        if !self.renderer.field_list(&mut sql, metadata.all_indices()) {
            return None;
        }
        sql.push_str(") VALUES (");
        if !self.renderer.value_list(&mut sql, row, metadata.all_indices()) {
            return None;
        }
        sql.push(')');
        Some(self.statement(StatementKind::Insert, row, sql))
    }

    /// `UPDATE <table> SET <changed columns> WHERE <primary key>`.
    #[must_use]
    pub fn update(&self, row: &[SqlValue], changed: &[usize]) -> Option<Statement> {
        let mut sql = format!("UPDATE {} SET ", self.table);
        if !self
            .renderer
            .equality_list(&mut sql, row, COMMA, changed.iter().copied())
        {
            return None;
        }
        if !self.push_where(&mut sql, row) {
            return None;
        }
        Some(self.statement(StatementKind::Update, row, sql))
    }

    /// `DELETE FROM <table> WHERE <primary key>`.
    #[must_use]
    pub fn delete(&self, row: &[SqlValue]) -> Option<Statement> {
        let mut sql = format!("DELETE FROM {}", self.table);
        if !self.push_where(&mut sql, row) {
            return None;
        }
        Some(self.statement(StatementKind::Delete, row, sql))
    }
}
