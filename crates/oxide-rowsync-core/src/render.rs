//! SQL fragment rendering.
//!
//! Every list fragment (column lists, value lists, `col=val` pairs, key
//! matches, null checks, difference predicates) goes through
//! [`Renderer::render_list`], which takes the per-item operation as a
//! [`RenderOp`]. It reports whether anything was written so callers can
//! refuse to build a statement around an empty clause.

use crate::dialect::Dialect;
use crate::schema::TableMetadata;
use crate::value::SqlValue;

/// Delimiter for `SET` clauses and column lists.
pub const COMMA: &str = ",";
/// Delimiter for `WHERE` conjunctions.
pub const AND: &str = " AND ";
/// Delimiter for `WHERE` disjunctions.
pub const OR: &str = " OR ";

/// What to render for each selected column.
#[derive(Debug, Clone, Copy)]
pub enum RenderOp<'a> {
    /// `` `col` ``
    Field,
    /// The quoted value of the column in the row.
    Value(&'a [SqlValue]),
    /// `` `col`=value ``
    Equal(&'a [SqlValue]),
    /// `` `col`=value ``, or `` `col` IS NULL `` for a NULL value.
    Match(&'a [SqlValue]),
    /// `` alias.`col` IS NULL ``
    NullCheck(&'a str),
    /// Null-safe inequality between `left.col` and `right.col`.
    Diff(&'a str, &'a str),
}

/// Renders fragments for one table layout in one dialect.
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    metadata: &'a TableMetadata,
    dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(metadata: &'a TableMetadata, dialect: &'a dyn Dialect) -> Self {
        Self { metadata, dialect }
    }

    /// Returns the table layout.
    #[must_use]
    pub const fn metadata(&self) -> &'a TableMetadata {
        self.metadata
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    fn render_one(&self, out: &mut String, op: RenderOp<'_>, index: usize) {
        let field = || self.dialect.quote_identifier(self.metadata.column_name(index));
        match op {
            RenderOp::Field => out.push_str(&field()),
            RenderOp::Value(row) => out.push_str(&self.dialect.quote_value(&row[index])),
            RenderOp::Equal(row) => {
                out.push_str(&field());
                out.push('=');
                out.push_str(&self.dialect.quote_value(&row[index]));
            }
            RenderOp::Match(row) => {
                out.push_str(&field());
                if row[index].is_null() {
                    out.push_str(" IS NULL");
                } else {
                    out.push('=');
                    out.push_str(&self.dialect.quote_value(&row[index]));
                }
            }
            RenderOp::NullCheck(alias) => {
                out.push_str(alias);
                out.push('.');
                out.push_str(&field());
                out.push_str(" IS NULL");
            }
            RenderOp::Diff(left, right) => {
                let field = field();
                let predicate = self
                    .dialect
                    .null_safe_differs(&format!("{left}.{field}"), &format!("{right}.{field}"));
                out.push_str(&predicate);
            }
        }
    }

    /// Appends `op` for each index, separated by `delimiter`.
    ///
    /// Returns false when `indices` was empty and nothing was written.
    pub fn render_list(
        &self,
        out: &mut String,
        op: RenderOp<'_>,
        delimiter: &str,
        indices: impl IntoIterator<Item = usize>,
    ) -> bool {
        let mut writing_started = false;
        for index in indices {
            if writing_started {
                out.push_str(delimiter);
            }
            self.render_one(out, op, index);
            writing_started = true;
        }
        writing_started
    }

    /// `` `c1`,`c2` `` for the given columns.
    pub fn field_list(&self, out: &mut String, indices: impl IntoIterator<Item = usize>) -> bool {
        self.render_list(out, RenderOp::Field, COMMA, indices)
    }

    /// `v1,v2` for the given columns of `row`.
    pub fn value_list(
        &self,
        out: &mut String,
        row: &[SqlValue],
        indices: impl IntoIterator<Item = usize>,
    ) -> bool {
        self.render_list(out, RenderOp::Value(row), COMMA, indices)
    }

    /// `` `c1`=v1<delimiter>`c2`=v2 `` for the given columns of `row`.
    pub fn equality_list(
        &self,
        out: &mut String,
        row: &[SqlValue],
        delimiter: &str,
        indices: impl IntoIterator<Item = usize>,
    ) -> bool {
        self.render_list(out, RenderOp::Equal(row), delimiter, indices)
    }

    /// `` `c1`=v1 AND `c2` IS NULL `` locating `row` by its primary key.
    pub fn key_match_list(&self, out: &mut String, row: &[SqlValue]) -> bool {
        let indices = self.metadata.primary_key_indices().iter().copied();
        self.render_list(out, RenderOp::Match(row), AND, indices)
    }

    /// `` alias.`c1` IS NULL AND alias.`c2` IS NULL `` for the primary key.
    pub fn null_check_list(&self, out: &mut String, alias: &str) -> bool {
        let indices = self.metadata.primary_key_indices().iter().copied();
        self.render_list(out, RenderOp::NullCheck(alias), AND, indices)
    }

    /// OR of null-safe inequalities over the non-key columns.
    pub fn diff_predicate_list(&self, out: &mut String, left: &str, right: &str) -> bool {
        let indices = self.metadata.non_primary_key_indices().iter().copied();
        self.render_list(out, RenderOp::Diff(left, right), OR, indices)
    }
}
