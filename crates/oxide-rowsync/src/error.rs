//! Error types for a sync run.

use std::path::PathBuf;

use oxide_rowsync_core::DiffError;

/// Errors that can occur while producing a sync script.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Schema mismatch or malformed data detected by the diff engine.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// Database error while reading schema or rows.
    #[error("Database error: {0}")]
    Fetch(#[from] sqlx::Error),

    /// Schema discovery returned no columns.
    #[error("Table '{0}' has no columns or does not exist")]
    EmptyTable(String),

    /// IO error (reading option files, writing the script).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed option file.
    #[error("Cannot read config file '{path}': {message}")]
    Config {
        /// Path to the option file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A required key is absent from an option file.
    #[error("Missing '{key}' in config file '{path}'")]
    MissingConfigKey {
        /// Path to the option file.
        path: PathBuf,
        /// The missing key.
        key: &'static str,
    },

    /// An endpoint that is neither a known URL nor a readable option file.
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The requested strategy cannot run with the given endpoints.
    #[error("{0}")]
    StrategyUnavailable(String),
}

impl SyncError {
    /// Returns true if the run stopped because the two tables differ in
    /// structure.
    #[must_use]
    pub const fn is_schema_incompatible(&self) -> bool {
        matches!(self, Self::Diff(DiffError::SchemaIncompatible { .. }))
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
