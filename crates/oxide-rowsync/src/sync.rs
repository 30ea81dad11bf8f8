//! Running a table sync end to end.

use std::fmt;

use tracing::info;

use oxide_rowsync_core::{Renderer, Statement, StatementBuilder, TableMetadata};

use crate::engine::{run_local, run_remote, Endpoints};
use crate::error::{Result, SyncError};
use crate::output::StatementSink;

/// Where the comparison happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Remote when both tables share a connection, local otherwise.
    #[default]
    Auto,
    /// Load the target into memory and compare on the client.
    Local,
    /// Let the server compare with join queries.
    Remote,
}

impl Strategy {
    /// Resolves `Auto` for the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StrategyUnavailable`] for `Remote` with two
    /// separate connections.
    pub fn resolve(self, endpoints: &Endpoints<'_>) -> Result<Self> {
        match (self, endpoints.is_shared()) {
            (Self::Auto, true) => Ok(Self::Remote),
            (Self::Auto, false) => Ok(Self::Local),
            (Self::Remote, false) => Err(SyncError::StrategyUnavailable(
                "remote diffing needs both tables on one connection".to_string(),
            )),
            (strategy, _) => Ok(strategy),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

/// A source/target table pair and how to compare them.
#[derive(Debug, Clone)]
pub struct TableSync {
    source_table: String,
    target_table: String,
    strategy: Strategy,
}

impl TableSync {
    /// Creates a sync of `target_table` from `source_table`.
    pub fn new(source_table: impl Into<String>, target_table: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            target_table: target_table.into(),
            strategy: Strategy::Auto,
        }
    }

    /// Sets the strategy.
    #[must_use]
    pub const fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Source table name.
    #[must_use]
    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    /// Target table name.
    #[must_use]
    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    /// Describes both tables and checks that they are compatible.
    ///
    /// # Errors
    ///
    /// Returns a schema error if the tables differ in columns or primary
    /// key, or a database error if either cannot be described.
    pub async fn describe(&self, endpoints: &mut Endpoints<'_>) -> Result<TableMetadata> {
        let source = endpoints.source().describe(&self.source_table).await?;
        let target = endpoints.target().describe(&self.target_table).await?;
        source.ensure_compatible(&target, &self.source_table, &self.target_table)?;
        Ok(target)
    }

    /// Diffs the tables, handing every statement to `sink`.
    ///
    /// Nothing reaches the sink unless the schemas are compatible.
    /// Statements are rendered for the target's database.
    ///
    /// # Errors
    ///
    /// Returns the first schema, database or output error.
    pub async fn run<S: StatementSink>(
        &self,
        endpoints: &mut Endpoints<'_>,
        sink: &mut S,
    ) -> Result<()> {
        let strategy = self.strategy.resolve(endpoints)?;
        let metadata = self.describe(endpoints).await?;
        info!(
            source = %self.source_table,
            target = %self.target_table,
            columns = metadata.field_count(),
            strategy = %strategy,
            "Comparing tables"
        );

        let dialect = endpoints.target().dialect();
        let builder = StatementBuilder::new(Renderer::new(&metadata, dialect), &self.target_table);
        match strategy {
            Strategy::Remote => {
                run_remote(builder, &self.source_table, endpoints.target(), sink).await
            }
            Strategy::Local | Strategy::Auto => {
                run_local(builder, &self.source_table, endpoints, sink).await
            }
        }
    }

    /// Diffs the tables and returns the statements.
    ///
    /// # Errors
    ///
    /// See [`TableSync::run`].
    pub async fn collect(&self, endpoints: &mut Endpoints<'_>) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        self.run(endpoints, &mut statements).await?;
        Ok(statements)
    }
}
