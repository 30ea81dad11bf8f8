//! Table synchronization for MySQL and SQLite.
//!
//! `oxide-rowsync` compares two tables with the same columns and primary key
//! and writes the INSERT, UPDATE and DELETE statements that make the target
//! equal to the source. The statements are printed, never executed.
//!
//! # Strategies
//!
//! - **Local** - the target table is loaded into memory and the source table
//!   is streamed past it. Works across servers.
//! - **Remote** - three join queries let the server find the differences.
//!   Needs both tables on one connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_rowsync::prelude::*;
//!
//! let mut conn = DbConnection::connect(&"mysql://sync:pw@db/airports".parse()?).await?;
//! let statements = TableSync::new("airport_staging", "airport")
//!     .collect(&mut Endpoints::Shared(&mut conn))
//!     .await?;
//! for statement in statements {
//!     println!("{statement}");
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Both tables on one server, compared with join queries
//! oxide-rowsync --target prod.cnf airport_staging airport
//!
//! # Tables on two servers, compared in memory
//! oxide-rowsync --source staging.cnf --target prod.cnf airport airport -o sync.sql
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod output;
pub mod sync;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, Endpoint};
    pub use crate::connection::DbConnection;
    pub use crate::engine::Endpoints;
    pub use crate::error::{Result, SyncError};
    pub use crate::output::{DiffSummary, StatementSink, StatementWriter};
    pub use crate::sync::{Strategy, TableSync};
    pub use oxide_rowsync_core::{Statement, StatementKind};
}
