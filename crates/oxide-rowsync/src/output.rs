//! Writing the generated script.

use std::fmt;
use std::io::Write;

use oxide_rowsync_core::{Statement, StatementKind};

use crate::error::Result;

/// Number of statements written, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// INSERT statements.
    pub inserts: usize,
    /// UPDATE statements.
    pub updates: usize,
    /// DELETE statements.
    pub deletes: usize,
}

impl DiffSummary {
    /// Total number of statements.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }

    /// Returns true if the tables were already in sync.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn record(&mut self, kind: StatementKind) {
        match kind {
            StatementKind::Insert => self.inserts += 1,
            StatementKind::Update => self.updates += 1,
            StatementKind::Delete => self.deletes += 1,
        }
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserts, {} updates, {} deletes",
            self.inserts, self.updates, self.deletes
        )
    }
}

/// Receives statements as the engines produce them.
pub trait StatementSink {
    /// Handles one statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be stored.
    fn emit(&mut self, statement: Statement) -> Result<()>;

    /// Handles an optional statement; `None` is a suppressed one.
    ///
    /// # Errors
    ///
    /// See [`StatementSink::emit`].
    fn emit_opt(&mut self, statement: Option<Statement>) -> Result<()> {
        match statement {
            Some(statement) => self.emit(statement),
            None => Ok(()),
        }
    }
}

impl StatementSink for Vec<Statement> {
    fn emit(&mut self, statement: Statement) -> Result<()> {
        self.push(statement);
        Ok(())
    }
}

/// Writes one `<sql>;` line per statement and counts them.
pub struct StatementWriter<W: Write> {
    out: W,
    summary: DiffSummary,
}

impl<W: Write> StatementWriter<W> {
    /// Creates a writer.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            summary: DiffSummary {
                inserts: 0,
                updates: 0,
                deletes: 0,
            },
        }
    }

    /// Statements written so far.
    #[must_use]
    pub const fn summary(&self) -> DiffSummary {
        self.summary
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`](crate::error::SyncError::Io) if flushing fails.
    pub fn finish(mut self) -> Result<(W, DiffSummary)> {
        self.out.flush()?;
        Ok((self.out, self.summary))
    }
}

impl<W: Write> StatementSink for StatementWriter<W> {
    fn emit(&mut self, statement: Statement) -> Result<()> {
        writeln!(self.out, "{statement}")?;
        self.summary.record(statement.kind());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_rowsync_core::dialect::MySqlDialect;
    use oxide_rowsync_core::{row, Renderer, StatementBuilder, TableMetadata};

    #[test]
    fn test_writer_lines_and_summary() {
        let meta = TableMetadata::new(vec!["id".into(), "v".into()], [0]).unwrap();
        let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "t");

        let mut writer = StatementWriter::new(Vec::new());
        writer.emit_opt(builder.insert(&row!["1", "a"])).unwrap();
        writer.emit_opt(builder.update(&row!["2", "b"], &[1])).unwrap();
        writer.emit_opt(builder.update(&row!["3", "c"], &[])).unwrap();
        writer.emit_opt(builder.delete(&row!["4", "d"])).unwrap();

        let (bytes, summary) = writer.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "INSERT INTO t (`id`,`v`) VALUES ('1','a');\n\
             UPDATE t SET `v`='b' WHERE `id`='2';\n\
             DELETE FROM t WHERE `id`='4';\n"
        );
        assert_eq!(
            summary,
            DiffSummary {
                inserts: 1,
                updates: 1,
                deletes: 1
            }
        );
        assert_eq!(summary.to_string(), "1 inserts, 1 updates, 1 deletes");
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_empty_summary() {
        assert!(DiffSummary::default().is_empty());
    }
}
