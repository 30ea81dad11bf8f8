use futures::TryStreamExt;
use tracing::{debug, info, warn};

use oxide_rowsync_core::{RemoteDiff, RemoteQuery, StatementBuilder};

use crate::connection::DbConnection;
use crate::error::Result;
use crate::output::StatementSink;

/// Diffs on the server.
///
/// Both tables must be reachable through `conn`. The changed, new and old
/// rows queries run one after the other, so the script lists UPDATEs, then
/// INSERTs, then DELETEs.
///
/// # Errors
///
/// Returns the first database, decoding or output error.
pub async fn run_remote<S: StatementSink>(
    builder: StatementBuilder<'_>,
    source_table: &str,
    conn: &mut DbConnection,
    sink: &mut S,
) -> Result<()> {
    if !builder.renderer().metadata().has_primary_key() {
        warn!(
            table = %builder.table(),
            "Table has no primary key, nothing to compare"
        );
        return Ok(());
    }

    let diff = RemoteDiff::new(builder, source_table);
    for query in RemoteQuery::ALL {
        let Some(sql) = diff.query(query) else {
            debug!(query = query.label(), "No columns to compare, skipping");
            continue;
        };

        let mut count = 0usize;
        let mut rows = conn.fetch_rows(&sql);
        while let Some(row) = rows.try_next().await? {
            count += 1;
            sink.emit_opt(diff.handle_row(query, &row)?)?;
        }
        info!(query = query.label(), rows = count, "Query finished");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_rowsync_core::{Renderer, Statement};

    #[tokio::test]
    async fn test_remote_statement_order() {
        let mut conn = DbConnection::sqlite_memory().await.unwrap();
        conn.execute(
            "CREATE TABLE src (id INTEGER PRIMARY KEY, v TEXT);
             CREATE TABLE dst (id INTEGER PRIMARY KEY, v TEXT);
             INSERT INTO src VALUES (1, 'a'), (2, 'b'), (4, NULL);
             INSERT INTO dst VALUES (2, 'x'), (3, 'c'), (4, NULL);",
        )
        .await
        .unwrap();
        let meta = conn.describe("dst").await.unwrap();
        let builder = StatementBuilder::new(Renderer::new(&meta, conn.dialect()), "dst");

        let mut out: Vec<Statement> = Vec::new();
        run_remote(builder, "src", &mut conn, &mut out).await.unwrap();

        let sql: Vec<&str> = out.iter().map(Statement::sql).collect();
        assert_eq!(
            sql,
            vec![
                "UPDATE dst SET `v`='b' WHERE `id`='2'",
                "INSERT INTO dst (`id`,`v`) VALUES ('1','a')",
                "DELETE FROM dst WHERE `id`='3'",
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_key_only_table() {
        let mut conn = DbConnection::sqlite_memory().await.unwrap();
        conn.execute(
            "CREATE TABLE src (a TEXT, b TEXT, PRIMARY KEY (a, b));
             CREATE TABLE dst (a TEXT, b TEXT, PRIMARY KEY (a, b));
             INSERT INTO src VALUES ('x', '1'), ('y', '2');
             INSERT INTO dst VALUES ('y', '2');",
        )
        .await
        .unwrap();
        let meta = conn.describe("dst").await.unwrap();
        let builder = StatementBuilder::new(Renderer::new(&meta, conn.dialect()), "dst");

        let mut out: Vec<Statement> = Vec::new();
        run_remote(builder, "src", &mut conn, &mut out).await.unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sql(), "INSERT INTO dst (`a`,`b`) VALUES ('x','1')");
    }
}
