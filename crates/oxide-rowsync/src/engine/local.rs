use futures::TryStreamExt;
use tracing::{debug, info, warn};

use oxide_rowsync_core::{LocalDiff, RowIndex, StatementBuilder};

use super::Endpoints;
use crate::error::Result;
use crate::output::StatementSink;

/// Diffs on the client.
///
/// The whole target table is loaded into an index first; the source table
/// is then streamed and compared row by row. Target rows no source row
/// matched are deleted at the end.
///
/// # Errors
///
/// Returns the first database, decoding or output error.
pub async fn run_local<S: StatementSink>(
    builder: StatementBuilder<'_>,
    source_table: &str,
    endpoints: &mut Endpoints<'_>,
    sink: &mut S,
) -> Result<()> {
    let metadata = builder.renderer().metadata();
    if !metadata.has_primary_key() {
        warn!(
            table = %builder.table(),
            "Table has no primary key, nothing to compare"
        );
        return Ok(());
    }

    let target_sql = format!("SELECT * FROM {}", builder.table());
    let mut index = RowIndex::default();
    {
        let mut rows = endpoints.target().fetch_rows(&target_sql);
        while let Some(row) = rows.try_next().await? {
            index.insert(metadata, row)?;
        }
    }
    info!(table = %builder.table(), rows = index.len(), "Loaded target rows");

    let source_sql = format!("SELECT * FROM {source_table}");
    let mut diff = LocalDiff::new(builder, &index);
    let mut scanned = 0usize;
    {
        let mut rows = endpoints.source().fetch_rows(&source_sql);
        while let Some(row) = rows.try_next().await? {
            scanned += 1;
            sink.emit_opt(diff.diff_row(&row)?)?;
        }
    }
    debug!(scanned, matched = diff.matched(), "Compared source rows");

    for statement in diff.finish() {
        sink.emit(statement)?;
    }
    Ok(())
}
