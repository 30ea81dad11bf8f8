//! Structural description shared by the source and target tables.
//!
//! A [`TableMetadata`] is captured once per table and compared for exact
//! equality before any diff work starts. Columns are identified by their
//! position from then on.

use std::collections::BTreeSet;

use crate::error::{DiffError, Result, SchemaError};
use crate::value::{Composite, SqlValue};

/// Largest number of columns a table may have.
pub const MAX_COLUMNS: usize = u16::MAX as usize;

/// A column as reported by schema discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Creates a column description.
    #[must_use]
    pub fn new(name: impl Into<String>, primary_key: bool) -> Self {
        Self {
            name: name.into(),
            primary_key,
        }
    }
}

/// Column layout and primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    field_names: Vec<String>,
    primary_key: Vec<usize>,
    non_primary_key: Vec<usize>,
}

impl TableMetadata {
    /// Creates the descriptor from column names and primary-key positions.
    ///
    /// Primary-key positions are normalized into a sorted set.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TooManyColumns`] when the table is wider than
    /// [`MAX_COLUMNS`], and [`SchemaError::PrimaryKeyOutOfRange`] when a key
    /// index does not name a column.
    pub fn new(
        field_names: Vec<String>,
        primary_key: impl IntoIterator<Item = usize>,
    ) -> std::result::Result<Self, SchemaError> {
        let field_count = field_names.len();
        if field_count > MAX_COLUMNS {
            return Err(SchemaError::TooManyColumns {
                count: field_count,
                max: MAX_COLUMNS,
            });
        }

        let primary_key: BTreeSet<usize> = primary_key.into_iter().collect();
        if let Some(&index) = primary_key.iter().find(|&&i| i >= field_count) {
            return Err(SchemaError::PrimaryKeyOutOfRange { index, field_count });
        }

        let non_primary_key = (0..field_count)
            .filter(|i| !primary_key.contains(i))
            .collect();

        Ok(Self {
            field_names,
            primary_key: primary_key.into_iter().collect(),
            non_primary_key,
        })
    }

    /// Creates the descriptor from schema-discovery output, in column order.
    ///
    /// # Errors
    ///
    /// See [`TableMetadata::new`].
    pub fn from_columns(
        columns: impl IntoIterator<Item = ColumnInfo>,
    ) -> std::result::Result<Self, SchemaError> {
        let mut names = Vec::new();
        let mut primary_key = Vec::new();
        for (index, column) in columns.into_iter().enumerate() {
            if column.primary_key {
                primary_key.push(index);
            }
            names.push(column.name);
        }
        Self::new(names, primary_key)
    }

    /// Number of columns.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    /// Column names in table order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.field_names
    }

    /// Name of the column at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a column position.
    #[must_use]
    pub fn column_name(&self, index: usize) -> &str {
        &self.field_names[index]
    }

    /// Every column position, in order.
    pub fn all_indices(&self) -> std::ops::Range<usize> {
        0..self.field_count()
    }

    /// Primary-key positions, sorted.
    #[must_use]
    pub fn primary_key_indices(&self) -> &[usize] {
        &self.primary_key
    }

    /// Positions that are not part of the primary key, in order.
    #[must_use]
    pub fn non_primary_key_indices(&self) -> &[usize] {
        &self.non_primary_key
    }

    /// Returns whether the table declares a primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Returns true when both tables have the same columns, in the same
    /// order, and the same primary key.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.field_names == other.field_names && self.primary_key == other.primary_key
    }

    /// Checks compatibility, describing the first difference found.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::SchemaIncompatible`] when the tables differ.
    pub fn ensure_compatible(
        &self,
        other: &Self,
        source_table: &str,
        target_table: &str,
    ) -> Result<()> {
        let Some(reason) = self.first_difference(other) else {
            return Ok(());
        };
        Err(DiffError::SchemaIncompatible {
            source_table: source_table.to_string(),
            target_table: target_table.to_string(),
            reason,
        })
    }

    fn first_difference(&self, other: &Self) -> Option<String> {
        let mismatch = self
            .field_names
            .iter()
            .zip(&other.field_names)
            .enumerate()
            .find(|(_, (a, b))| a != b);
        if let Some((index, (a, b))) = mismatch {
            return Some(format!("column {index} is `{a}` in one table and `{b}` in the other"));
        }
        if self.field_count() != other.field_count() {
            return Some(format!(
                "{} columns versus {} columns",
                self.field_count(),
                other.field_count()
            ));
        }
        if self.primary_key != other.primary_key {
            return Some(format!(
                "primary key ({}) versus ({})",
                self.key_names().join(", "),
                other.key_names().join(", ")
            ));
        }
        None
    }

    fn key_names(&self) -> Vec<&str> {
        self.primary_key
            .iter()
            .map(|&i| self.field_names[i].as_str())
            .collect()
    }

    /// Checks that a row has one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::RowWidth`] otherwise.
    pub fn check_row_width(&self, row: &[SqlValue]) -> Result<()> {
        if row.len() == self.field_count() {
            Ok(())
        } else {
            Err(DiffError::RowWidth {
                expected: self.field_count(),
                actual: row.len(),
            })
        }
    }

    /// Extracts the primary-key composite of a row.
    ///
    /// The row must have been checked with [`TableMetadata::check_row_width`].
    #[must_use]
    pub fn extract_key(&self, row: &[SqlValue]) -> Composite {
        Composite::new(self.primary_key.iter().map(|&i| row[i].clone()).collect())
    }

    /// Positions among `indices` where the two rows differ.
    #[must_use]
    pub fn changed_indices(
        left: &[SqlValue],
        right: &[SqlValue],
        indices: impl IntoIterator<Item = usize>,
    ) -> Vec<usize> {
        indices
            .into_iter()
            .filter(|&i| left[i] != right[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| (*s).to_string()).collect()
    }

    fn airports() -> TableMetadata {
        TableMetadata::new(names(&["code", "country", "name", "city"]), [1, 0]).unwrap()
    }

    #[test]
    fn test_derived_index_sets() {
        let meta = airports();
        assert_eq!(meta.field_count(), 4);
        assert_eq!(meta.primary_key_indices(), &[0, 1]);
        assert_eq!(meta.non_primary_key_indices(), &[2, 3]);
        assert_eq!(meta.all_indices().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(meta.has_primary_key());
    }

    #[test]
    fn test_duplicate_key_indices_are_normalized() {
        let meta = TableMetadata::new(names(&["a", "b"]), [1, 1, 0]).unwrap();
        assert_eq!(meta.primary_key_indices(), &[0, 1]);
        assert!(meta.non_primary_key_indices().is_empty());
    }

    #[test]
    fn test_primary_key_out_of_range() {
        let err = TableMetadata::new(names(&["a", "b"]), [2]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::PrimaryKeyOutOfRange {
                index: 2,
                field_count: 2
            }
        );
    }

    #[test]
    fn test_too_many_columns() {
        let cols = vec![String::from("c"); MAX_COLUMNS + 1];
        let err = TableMetadata::new(cols, []).unwrap_err();
        assert!(matches!(err, SchemaError::TooManyColumns { .. }));
    }

    #[test]
    fn test_from_columns() {
        let meta = TableMetadata::from_columns([
            ColumnInfo::new("id", true),
            ColumnInfo::new("name", false),
            ColumnInfo::new("region", true),
        ])
        .unwrap();
        assert_eq!(meta.column_names(), &names(&["id", "name", "region"]));
        assert_eq!(meta.primary_key_indices(), &[0, 2]);
        assert_eq!(meta.column_name(1), "name");
    }

    #[test]
    fn test_compatibility_ignores_key_order() {
        let a = airports();
        let b = TableMetadata::new(names(&["code", "country", "name", "city"]), [0, 1]).unwrap();
        assert!(a.is_compatible(&b));
        assert!(b.is_compatible(&a));
        assert!(a.ensure_compatible(&b, "s", "t").is_ok());
    }

    #[test]
    fn test_renamed_column_is_incompatible() {
        let a = airports();
        let b = TableMetadata::new(names(&["code", "country", "title", "city"]), [0, 1]).unwrap();
        assert!(!a.is_compatible(&b));
        let err = a.ensure_compatible(&b, "src", "dst").unwrap_err();
        match err {
            DiffError::SchemaIncompatible {
                source_table,
                target_table,
                reason,
            } => {
                assert_eq!(source_table, "src");
                assert_eq!(target_table, "dst");
                assert!(reason.contains("column 2"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reordered_columns_are_incompatible() {
        let a = airports();
        let b = TableMetadata::new(names(&["code", "country", "city", "name"]), [0, 1]).unwrap();
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn test_extra_column_is_incompatible() {
        let a = airports();
        let b = TableMetadata::new(names(&["code", "country", "name", "city", "x"]), [0, 1])
            .unwrap();
        let err = a.ensure_compatible(&b, "s", "t").unwrap_err();
        assert!(err.to_string().contains("4 columns versus 5 columns"));
    }

    #[test]
    fn test_different_primary_key_is_incompatible() {
        let a = airports();
        let b = TableMetadata::new(names(&["code", "country", "name", "city"]), [0]).unwrap();
        assert!(!a.is_compatible(&b));
        let err = a.ensure_compatible(&b, "s", "t").unwrap_err();
        assert!(err.to_string().contains("primary key (code, country) versus (code)"));
    }

    #[test]
    fn test_extract_key_and_row_width() {
        let meta = airports();
        let r = row!["WAW", "PL", "Chopin", "Warsaw"];
        meta.check_row_width(&r).unwrap();
        assert_eq!(meta.extract_key(&r).values(), &r[0..2]);

        let short = row!["WAW"];
        assert_eq!(
            meta.check_row_width(&short).unwrap_err(),
            DiffError::RowWidth {
                expected: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn test_changed_indices() {
        let a = row!["1", "x", None::<&str>, ""];
        let b = row!["1", "X", "", ""];
        assert_eq!(TableMetadata::changed_indices(&a, &b, 0..4), vec![1, 2]);
        assert!(TableMetadata::changed_indices(&a, &a, 0..4).is_empty());
    }
}
