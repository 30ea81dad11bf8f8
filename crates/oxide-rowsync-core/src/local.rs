//! Client-side diffing.
//!
//! The target rows are loaded into an immutable [`RowIndex`]. Source rows
//! are then streamed through a [`LocalDiff`], which emits INSERTs and
//! UPDATEs as it goes and remembers which keys it has seen. Whatever the
//! index holds beyond those keys is deleted at the end.

use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::schema::TableMetadata;
use crate::statement::{Statement, StatementBuilder};
use crate::value::{Composite, Row};

/// Target rows keyed by primary-key composite.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    rows: BTreeMap<Composite, Row>,
}

impl RowIndex {
    /// Indexes rows by their primary-key composite.
    ///
    /// On duplicate composites the first row wins.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`](crate::DiffError::RowWidth) for a row
    /// that does not match the schema.
    pub fn build(metadata: &TableMetadata, rows: impl IntoIterator<Item = Row>) -> Result<Self> {
        let mut index = Self::default();
        for row in rows {
            index.insert(metadata, row)?;
        }
        Ok(index)
    }

    /// Adds one row, keeping an earlier row with the same composite.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`](crate::DiffError::RowWidth) for a row
    /// that does not match the schema.
    pub fn insert(&mut self, metadata: &TableMetadata, row: Row) -> Result<()> {
        metadata.check_row_width(&row)?;
        self.rows.entry(metadata.extract_key(&row)).or_insert(row);
        Ok(())
    }

    /// Looks up a row by composite.
    #[must_use]
    pub fn get(&self, key: &Composite) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose composite is not in `matched`, in composite order.
    pub fn residual<'a>(
        &'a self,
        matched: &'a HashSet<Composite>,
    ) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows
            .iter()
            .filter(move |(key, _)| !matched.contains(*key))
            .map(|(_, row)| row)
    }
}

/// Streaming comparison of source rows against an indexed target.
pub struct LocalDiff<'a> {
    builder: StatementBuilder<'a>,
    index: &'a RowIndex,
    matched: HashSet<Composite>,
}

impl<'a> LocalDiff<'a> {
    /// Starts a comparison against `index`; statements address the builder's
    /// table.
    #[must_use]
    pub fn new(builder: StatementBuilder<'a>, index: &'a RowIndex) -> Self {
        Self {
            builder,
            index,
            matched: HashSet::new(),
        }
    }

    fn metadata(&self) -> &'a TableMetadata {
        self.builder.renderer().metadata()
    }

    /// Compares one source row with its counterpart in the target.
    ///
    /// Returns an INSERT when the key is unknown, an UPDATE when some
    /// column differs, and nothing otherwise. Tables without a primary key
    /// never produce statements.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`](crate::DiffError::RowWidth) for a row
    /// that does not match the schema.
    pub fn diff_row(&mut self, row: &Row) -> Result<Option<Statement>> {
        let metadata = self.metadata();
        metadata.check_row_width(row)?;
        if !metadata.has_primary_key() {
            return Ok(None);
        }

        let key = metadata.extract_key(row);
        let Some(existing) = self.index.get(&key) else {
            return Ok(self.builder.insert(row));
        };

        // Key columns are compared as well; they can only differ if the
        // key values compare equal on the server but not byte-wise.
        let changed = TableMetadata::changed_indices(row, existing, metadata.all_indices());
        self.matched.insert(key);
        if changed.is_empty() {
            Ok(None)
        } else {
            Ok(self.builder.update(row, &changed))
        }
    }

    /// Number of target rows matched so far.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matched.len()
    }

    /// Ends the stream, returning DELETEs for unmatched target rows in
    /// primary-key order.
    #[must_use]
    pub fn finish(self) -> Vec<Statement> {
        if !self.metadata().has_primary_key() {
            return Vec::new();
        }
        self.index
            .residual(&self.matched)
            .filter_map(|row| self.builder.delete(row))
            .collect()
    }
}

/// Diffs two in-memory row sets: INSERTs and UPDATEs in source order,
/// followed by DELETEs in primary-key order.
///
/// # Errors
///
/// Returns [`DiffError::RowWidth`](crate::DiffError::RowWidth) for a row
/// that does not match the schema.
pub fn diff_rows(
    builder: StatementBuilder<'_>,
    source: impl IntoIterator<Item = Row>,
    target: impl IntoIterator<Item = Row>,
) -> Result<Vec<Statement>> {
    let index = RowIndex::build(builder.renderer().metadata(), target)?;
    let mut diff = LocalDiff::new(builder, &index);
    let mut statements = Vec::new();
    for row in source {
        statements.extend(diff.diff_row(&row)?);
    }
    statements.extend(diff.finish());
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySqlDialect;
    use crate::render::Renderer;
    use crate::row;
    use crate::statement::StatementKind;
    use crate::DiffError;

    fn metadata() -> TableMetadata {
        TableMetadata::new(vec!["id".into(), "name".into(), "city".into()], [0]).unwrap()
    }

    fn sql(statements: &[Statement]) -> Vec<String> {
        statements.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_identical_tables_produce_nothing() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let rows = vec![row!["1", "a", None::<&str>], row!["2", "b", "c"]];
        let out = diff_rows(builder, rows.clone(), rows).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_insert_only() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["1", "a", "x"], row!["2", "b", "y"]];
        let target = vec![row!["1", "a", "x"]];
        let out = diff_rows(builder, source, target).unwrap();
        assert_eq!(
            sql(&out),
            vec!["INSERT INTO t (`id`,`name`,`city`) VALUES ('2','b','y');"]
        );
    }

    #[test]
    fn test_delete_only() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["1", "a", "x"]];
        let target = vec![row!["1", "a", "x"], row!["9", "z", "z"]];
        let out = diff_rows(builder, source, target).unwrap();
        assert_eq!(sql(&out), vec!["DELETE FROM t WHERE `id`='9';"]);
    }

    #[test]
    fn test_partial_column_update() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["1", "a", "new"]];
        let target = vec![row!["1", "a", "old"]];
        let out = diff_rows(builder, source, target).unwrap();
        assert_eq!(sql(&out), vec!["UPDATE t SET `city`='new' WHERE `id`='1';"]);
    }

    #[test]
    fn test_null_to_empty_string_is_a_change() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["1", "a", ""]];
        let target = vec![row!["1", "a", None::<&str>]];
        let out = diff_rows(builder, source, target).unwrap();
        assert_eq!(sql(&out), vec!["UPDATE t SET `city`='' WHERE `id`='1';"]);
    }

    #[test]
    fn test_order_of_statements() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["5", "e", "e"], row!["3", "c", "C"], row!["4", "d", "d"]];
        let target = vec![
            row!["8", "h", "h"],
            row!["3", "c", "c"],
            row!["1", "a", "a"],
        ];
        let out = diff_rows(builder, source, target).unwrap();
        let kinds: Vec<_> = out.iter().map(|s| (s.kind(), s.key().to_string())).collect();
        assert_eq!(
            kinds,
            vec![
                (StatementKind::Insert, String::from("(5)")),
                (StatementKind::Update, String::from("(3)")),
                (StatementKind::Insert, String::from("(4)")),
                (StatementKind::Delete, String::from("(1)")),
                (StatementKind::Delete, String::from("(8)")),
            ]
        );
    }

    #[test]
    fn test_residual_is_set_difference() {
        let meta = metadata();
        let index = RowIndex::build(
            &meta,
            vec![row!["1", "a", "a"], row!["2", "b", "b"], row!["3", "c", "c"]],
        )
        .unwrap();
        let matched: HashSet<Composite> = [meta.extract_key(&row!["2", "", ""])].into();
        let left: Vec<&Row> = index.residual(&matched).collect();
        assert_eq!(left, vec![&row!["1", "a", "a"], &row!["3", "c", "c"]]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let meta = metadata();
        let index =
            RowIndex::build(&meta, vec![row!["1", "first", ""], row!["1", "second", ""]]).unwrap();
        assert_eq!(index.len(), 1);
        let key = meta.extract_key(&row!["1", "", ""]);
        assert_eq!(index.get(&key).unwrap()[1].as_text(), Some("first"));
    }

    #[test]
    fn test_keyless_table_produces_nothing() {
        let meta = TableMetadata::new(vec!["a".into(), "b".into()], []).unwrap();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let source = vec![row!["1", "x"], row!["2", "y"]];
        let target = vec![row!["1", "z"], row!["3", "w"]];
        let out = diff_rows(builder, source, target).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_row_width_mismatch() {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let err = diff_rows(builder, vec![row!["1"]], vec![]).unwrap_err();
        assert_eq!(
            err,
            DiffError::RowWidth {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_matched_count() {
        let meta = metadata();
        let index = RowIndex::build(&meta, vec![row!["1", "a", "a"]]).unwrap();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");
        let mut diff = LocalDiff::new(builder, &index);
        assert!(diff.diff_row(&row!["1", "a", "a"]).unwrap().is_none());
        assert_eq!(diff.matched(), 1);
        assert!(diff.finish().is_empty());
    }
}
