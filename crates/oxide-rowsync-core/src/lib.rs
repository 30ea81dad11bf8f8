//! # oxide-rowsync-core
//!
//! Computes the INSERT, UPDATE and DELETE statements that turn a target
//! table into a copy of a source table with the same columns and primary
//! key. This crate holds the database-agnostic part:
//!
//! - [`schema`] - the shared table layout and its compatibility check
//! - [`render`] / [`statement`] - SQL fragments and statements
//! - [`local`] - client-side diffing against an in-memory index
//! - [`remote`] - query generation for server-side diffing with joins
//! - [`dialect`] - literal escaping and null-safe comparison per database
//!
//! ## Example
//!
//! ```rust
//! use oxide_rowsync_core::dialect::MySqlDialect;
//! use oxide_rowsync_core::local::diff_rows;
//! use oxide_rowsync_core::{row, Renderer, StatementBuilder, TableMetadata};
//!
//! let meta = TableMetadata::new(vec!["id".into(), "name".into()], [0]).unwrap();
//! let builder = StatementBuilder::new(Renderer::new(&meta, &MySqlDialect), "people");
//!
//! let source = vec![row!["1", "Ann"], row!["2", "Bob"]];
//! let target = vec![row!["1", "Anne"], row!["3", "Eve"]];
//!
//! let sql: Vec<String> = diff_rows(builder, source, target)
//!     .unwrap()
//!     .iter()
//!     .map(ToString::to_string)
//!     .collect();
//!
//! assert_eq!(sql, vec![
//!     "UPDATE people SET `name`='Ann' WHERE `id`='1';",
//!     "INSERT INTO people (`id`,`name`) VALUES ('2','Bob');",
//!     "DELETE FROM people WHERE `id`='3';",
//! ]);
//! ```

pub mod dialect;
pub mod error;
pub mod local;
pub mod remote;
pub mod render;
pub mod schema;
pub mod statement;
pub mod value;

pub use dialect::Dialect;
pub use error::{DiffError, Result, SchemaError};
pub use local::{LocalDiff, RowIndex};
pub use remote::{RemoteDiff, RemoteQuery};
pub use render::{RenderOp, Renderer};
pub use schema::{ColumnInfo, TableMetadata};
pub use statement::{Statement, StatementBuilder, StatementKind};
pub use value::{Composite, Row, SqlValue};
