//! Error types for schema handling and diffing.

/// Errors raised while building a [`TableMetadata`](crate::schema::TableMetadata).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// More columns than a column index can address.
    #[error("table has {count} columns, at most {max} are supported")]
    TooManyColumns {
        /// Number of columns reported for the table.
        count: usize,
        /// Largest supported column count.
        max: usize,
    },

    /// A primary-key index does not point at a column.
    #[error("primary key index {index} is out of range for {field_count} columns")]
    PrimaryKeyOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of columns in the table.
        field_count: usize,
    },
}

/// Errors raised by the diff engines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// Source and target do not share columns and primary key.
    #[error("table definitions differ between {source_table} and {target_table}: {reason}")]
    SchemaIncompatible {
        /// Source table name.
        source_table: String,
        /// Target table name.
        target_table: String,
        /// First difference found.
        reason: String,
    },

    /// A fetched row does not have the width the schema announced.
    #[error("malformed row: expected {expected} values, got {actual}")]
    RowWidth {
        /// Width implied by the schema.
        expected: usize,
        /// Width of the row received.
        actual: usize,
    },

    /// Invalid schema description.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;
