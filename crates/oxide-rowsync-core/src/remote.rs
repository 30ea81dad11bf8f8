//! Server-side diffing.
//!
//! Three join queries let the database find the rows that need an UPDATE,
//! an INSERT, or a DELETE; the client only sees those rows. The queries
//! read the two tables independently, so rows written between them may be
//! reported twice or not at all. Callers wanting a consistent result must
//! run them inside one snapshot transaction.

use crate::error::{DiffError, Result};
use crate::render::Renderer;
use crate::schema::TableMetadata;
use crate::statement::{Statement, StatementBuilder};
use crate::value::SqlValue;

const SOURCE_ALIAS: &str = "s";
const TARGET_ALIAS: &str = "t";
const JOINED_ALIAS: &str = "j";

/// The three server-side queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteQuery {
    /// Rows on both sides whose non-key columns differ.
    Changed,
    /// Rows only in the source.
    New,
    /// Rows only in the target.
    Old,
}

impl RemoteQuery {
    /// All queries, in execution order.
    pub const ALL: [Self; 3] = [Self::Changed, Self::New, Self::Old];

    /// Short label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Changed => "changed rows",
            Self::New => "new rows",
            Self::Old => "old rows",
        }
    }
}

/// Query generation and result handling for a source/target pair living
/// on the same server.
pub struct RemoteDiff<'a> {
    builder: StatementBuilder<'a>,
    source_table: &'a str,
}

impl<'a> RemoteDiff<'a> {
    /// Creates the diff; statements address the builder's table, which is
    /// also the target of the joins.
    #[must_use]
    pub const fn new(builder: StatementBuilder<'a>, source_table: &'a str) -> Self {
        Self {
            builder,
            source_table,
        }
    }

    fn renderer(&self) -> Renderer<'a> {
        self.builder.renderer()
    }

    fn metadata(&self) -> &'a TableMetadata {
        self.renderer().metadata()
    }

    fn target_table(&self) -> &'a str {
        self.builder.table()
    }

    /// Returns the SQL for `query`, or `None` when the table shape makes the
    /// query meaningless (no primary key, or no non-key column to compare).
    #[must_use]
    pub fn query(&self, query: RemoteQuery) -> Option<String> {
        match query {
            RemoteQuery::Changed => self.changed_rows_query(),
            RemoteQuery::New => self.unmatched_rows_query(
                self.source_table,
                SOURCE_ALIAS,
                self.target_table(),
            ),
            RemoteQuery::Old => self.unmatched_rows_query(
                self.target_table(),
                TARGET_ALIAS,
                self.source_table,
            ),
        }
    }

    /// `SELECT s.*, t.* FROM source s JOIN target t USING (pk) WHERE <differs>`.
    #[must_use]
    pub fn changed_rows_query(&self) -> Option<String> {
        let renderer = self.renderer();
        let mut sql = format!(
            "SELECT {SOURCE_ALIAS}.*, {TARGET_ALIAS}.* FROM {} {SOURCE_ALIAS} JOIN {} {TARGET_ALIAS} USING (",
            self.source_table,
            self.target_table()
        );
        if !self.push_key_fields(&mut sql) {
            return None;
        }
        sql.push_str(") WHERE ");
        if !renderer.diff_predicate_list(&mut sql, SOURCE_ALIAS, TARGET_ALIAS) {
            return None;
        }
        Some(sql)
    }

    /// `SELECT s.* FROM source s LEFT JOIN target j USING (pk) WHERE j.pk IS NULL`.
    #[must_use]
    pub fn new_rows_query(&self) -> Option<String> {
        self.query(RemoteQuery::New)
    }

    /// `SELECT t.* FROM target t LEFT JOIN source j USING (pk) WHERE j.pk IS NULL`.
    #[must_use]
    pub fn old_rows_query(&self) -> Option<String> {
        self.query(RemoteQuery::Old)
    }

    fn unmatched_rows_query(&self, from: &str, alias: &str, other: &str) -> Option<String> {
        let mut sql = format!(
            "SELECT {alias}.* FROM {from} {alias} LEFT JOIN {other} {JOINED_ALIAS} USING ("
        );
        if !self.push_key_fields(&mut sql) {
            return None;
        }
        sql.push_str(") WHERE ");
        if !self.renderer().null_check_list(&mut sql, JOINED_ALIAS) {
            return None;
        }
        Some(sql)
    }

    fn push_key_fields(&self, sql: &mut String) -> bool {
        let key = self.metadata().primary_key_indices().iter().copied();
        self.renderer().field_list(sql, key)
    }

    /// Handles one row of the changed-rows query: source columns followed
    /// by target columns. Returns an UPDATE if a non-key column differs.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`] unless the row is twice as wide as
    /// the table.
    pub fn changed_row(&self, row: &[SqlValue]) -> Result<Option<Statement>> {
        let field_count = self.metadata().field_count();
        if row.len() != 2 * field_count {
            return Err(DiffError::RowWidth {
                expected: 2 * field_count,
                actual: row.len(),
            });
        }
        let (source, target) = row.split_at(field_count);
        let changed = TableMetadata::changed_indices(
            source,
            target,
            self.metadata().non_primary_key_indices().iter().copied(),
        );
        if changed.is_empty() {
            return Ok(None);
        }
        Ok(self.builder.update(source, &changed))
    }

    /// Handles one row of the new-rows query.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`] for a row that does not match the schema.
    pub fn new_row(&self, row: &[SqlValue]) -> Result<Option<Statement>> {
        self.metadata().check_row_width(row)?;
        Ok(self.builder.insert(row))
    }

    /// Handles one row of the old-rows query.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`] for a row that does not match the schema.
    pub fn old_row(&self, row: &[SqlValue]) -> Result<Option<Statement>> {
        self.metadata().check_row_width(row)?;
        Ok(self.builder.delete(row))
    }

    /// Dispatches a result row of `query` to its handler.
    ///
    /// # Errors
    ///
    /// See [`RemoteDiff::changed_row`], [`RemoteDiff::new_row`] and
    /// [`RemoteDiff::old_row`].
    pub fn handle_row(&self, query: RemoteQuery, row: &[SqlValue]) -> Result<Option<Statement>> {
        match query {
            RemoteQuery::Changed => self.changed_row(row),
            RemoteQuery::New => self.new_row(row),
            RemoteQuery::Old => self.old_row(row),
        }
    }
}
