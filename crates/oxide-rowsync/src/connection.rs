//! Database connections.
//!
//! Queries are sent as plain SQL text without bind parameters, so MySQL
//! answers with its text protocol and every value is read back in the form
//! the server prints it. SQLite converts non-text values to text on
//! request, which gives the same representation.

use std::str::FromStr;

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ColumnIndex, ConnectOptions, Connection, Decode, Executor};
use tracing::debug;

use oxide_rowsync_core::dialect::{MySqlDialect, SqliteDialect};
use oxide_rowsync_core::{ColumnInfo, Dialect, Row, SqlValue, TableMetadata};

use crate::config::{ConnectionConfig, Endpoint};
use crate::error::{Result, SyncError};

static MYSQL: MySqlDialect = MySqlDialect::new();
static SQLITE: SqliteDialect = SqliteDialect::new();

/// An open connection to one of the supported databases.
pub enum DbConnection {
    /// MySQL or MariaDB.
    MySql(MySqlConnection),
    /// SQLite.
    Sqlite(SqliteConnection),
}

impl DbConnection {
    /// Opens a connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unreadable option file or an
    /// invalid URL, and [`SyncError::Fetch`] if the connection fails.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Url(url) if url.starts_with("sqlite:") => {
                let options = SqliteConnectOptions::from_str(url)
                    .map_err(|e| SyncError::InvalidEndpoint(format!("{url}: {e}")))?;
                Ok(Self::Sqlite(options.connect().await?))
            }
            Endpoint::Url(url) => {
                let url = url.replacen("mariadb://", "mysql://", 1);
                let options = MySqlConnectOptions::from_str(&url)
                    .map_err(|e| SyncError::InvalidEndpoint(format!("{url}: {e}")))?;
                Ok(Self::MySql(options.connect().await?))
            }
            Endpoint::OptionFile(path) => {
                let config = ConnectionConfig::load(path)?;
                Ok(Self::MySql(mysql_options(&config).connect().await?))
            }
        }
    }

    /// Opens a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if SQLite cannot be opened.
    pub async fn sqlite_memory() -> Result<Self> {
        Ok(Self::Sqlite(SqliteConnection::connect(":memory:").await?))
    }

    /// The dialect statements for this database are rendered in.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            Self::MySql(_) => &MYSQL,
            Self::Sqlite(_) => &SQLITE,
        }
    }

    /// Executes SQL without returning rows, e.g. to replay a script.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] on any database error.
    pub async fn execute(&mut self, sql: &str) -> Result<()> {
        match self {
            Self::MySql(conn) => conn.execute(sql).await.map(drop)?,
            Self::Sqlite(conn) => conn.execute(sql).await.map(drop)?,
        }
        Ok(())
    }

    /// Reads the column layout and primary key of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::EmptyTable`] if the table reports no columns and
    /// [`SyncError::Fetch`] on database errors.
    pub async fn describe(&mut self, table: &str) -> Result<TableMetadata> {
        let columns = match self {
            Self::MySql(conn) => {
                let sql = format!("DESCRIBE {table}");
                debug!(sql = %sql, "Describing table");
                let rows = conn.fetch_all(sql.as_str()).await?;
                rows.iter()
                    .map(|row| {
                        let name = text_column(row, "Field")?;
                        let key = text_column(row, "Key")?;
                        Ok(ColumnInfo::new(name, key == "PRI"))
                    })
                    .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?
            }
            Self::Sqlite(conn) => {
                let sql = sqlite_table_info(table);
                debug!(sql = %sql, "Describing table");
                let rows = conn.fetch_all(sql.as_str()).await?;
                rows.iter()
                    .map(|row| {
                        let name = text_column(row, "name")?;
                        let pk = text_column(row, "pk")?;
                        Ok(ColumnInfo::new(name, pk != "0"))
                    })
                    .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?
            }
        };

        if columns.is_empty() {
            return Err(SyncError::EmptyTable(table.to_string()));
        }
        TableMetadata::from_columns(columns).map_err(|e| SyncError::Diff(e.into()))
    }

    /// Streams the rows returned by `sql`.
    pub fn fetch_rows<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>> {
        debug!(sql = %sql, "Fetching rows");
        match self {
            Self::MySql(conn) => conn
                .fetch(sql)
                .map(|row| row.and_then(|row| decode_row(&row)))
                .map_err(SyncError::from)
                .boxed(),
            Self::Sqlite(conn) => conn
                .fetch(sql)
                .map(|row| row.and_then(|row| decode_row(&row)))
                .map_err(SyncError::from)
                .boxed(),
        }
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the server rejects the goodbye.
    pub async fn close(self) -> Result<()> {
        match self {
            Self::MySql(conn) => conn.close().await?,
            Self::Sqlite(conn) => conn.close().await?,
        }
        Ok(())
    }
}

fn mysql_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .username(&config.user)
        .password(&config.password);
    if let Some(port) = config.port {
        options = options.port(port);
    }
    if let Some(socket) = &config.socket {
        options = options.socket(socket);
    }
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    options
}

/// `PRAGMA [schema.]table_info(table)` for a possibly qualified name.
fn sqlite_table_info(table: &str) -> String {
    match table.split_once('.') {
        Some((schema, name)) => format!("PRAGMA {schema}.table_info({name})"),
        None => format!("PRAGMA table_info({table})"),
    }
}

fn text_column<R>(row: &R, column: &str) -> std::result::Result<String, sqlx::Error>
where
    R: sqlx::Row,
    for<'c> &'c str: ColumnIndex<R>,
    for<'r> Option<Vec<u8>>: Decode<'r, R::Database>,
{
    let value = SqlValue::from_raw(row.try_get_unchecked::<Option<Vec<u8>>, _>(column)?);
    Ok(value.as_text().unwrap_or_default().to_string())
}

/// Reads every column of a row as raw bytes, without type checks.
fn decode_row<R>(row: &R) -> std::result::Result<Row, sqlx::Error>
where
    R: sqlx::Row,
    usize: ColumnIndex<R>,
    for<'r> Option<Vec<u8>>: Decode<'r, R::Database>,
{
    (0..row.len())
        .map(|i| {
            row.try_get_unchecked::<Option<Vec<u8>>, _>(i)
                .map(SqlValue::from_raw)
        })
        .collect()
}
