//! Diff engines.
//!
//! Both engines read rows from [`Endpoints`] and hand the statements they
//! produce to a [`StatementSink`](crate::output::StatementSink), in the
//! order they are generated.

mod local;
mod remote;

pub use local::run_local;
pub use remote::run_remote;

use crate::connection::DbConnection;

/// The connections a diff reads from.
pub enum Endpoints<'c> {
    /// Source and target tables are reachable through one connection.
    Shared(&'c mut DbConnection),
    /// Source and target live on different servers.
    Separate {
        /// Connection holding the source table.
        source: &'c mut DbConnection,
        /// Connection holding the target table.
        target: &'c mut DbConnection,
    },
}

impl Endpoints<'_> {
    /// Returns true if both tables share a connection.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Connection to read the source table from.
    pub fn source(&mut self) -> &mut DbConnection {
        match self {
            Self::Shared(conn) => conn,
            Self::Separate { source, .. } => source,
        }
    }

    /// Connection to read the target table from.
    pub fn target(&mut self) -> &mut DbConnection {
        match self {
            Self::Shared(conn) => conn,
            Self::Separate { target, .. } => target,
        }
    }
}
