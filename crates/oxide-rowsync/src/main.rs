//! oxide-rowsync CLI
//!
//! Prints the SQL that makes one table match another.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_rowsync::prelude::*;

/// Generate INSERT, UPDATE and DELETE statements that sync two tables.
#[derive(Parser)]
#[command(name = "oxide-rowsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source database (option file or URL). Defaults to the target.
    #[arg(short, long, env = "ROWSYNC_SOURCE")]
    source: Option<Endpoint>,

    /// Target database (option file or URL).
    #[arg(short, long, env = "ROWSYNC_TARGET")]
    target: Endpoint,

    /// Table holding the wanted contents.
    source_table: String,

    /// Table the statements apply to.
    target_table: String,

    /// Where to compare the tables.
    #[arg(long, value_enum, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// Write the script to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries the script
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let sync = TableSync::new(&cli.source_table, &cli.target_table).strategy(cli.strategy);

    let mut target = DbConnection::connect(&cli.target).await?;
    let mut source = match &cli.source {
        Some(endpoint) => Some(DbConnection::connect(endpoint).await?),
        None => None,
    };
    let mut endpoints = match source.as_mut() {
        Some(source) => Endpoints::Separate {
            source,
            target: &mut target,
        },
        None => Endpoints::Shared(&mut target),
    };

    let summary = match &cli.output {
        Some(path) => write_file(&sync, &mut endpoints, path).await?,
        None => {
            // Printed only once the whole script exists
            let mut writer = StatementWriter::new(Vec::new());
            sync.run(&mut endpoints, &mut writer).await?;
            let (script, summary) = writer.finish()?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&script)?;
            stdout.flush()?;
            summary
        }
    };
    info!(%summary, "Done");

    if let Some(source) = source {
        source.close().await?;
    }
    target.close().await?;
    Ok(())
}

/// Writes the script next to `path` and moves it into place on success.
async fn write_file(
    sync: &TableSync,
    endpoints: &mut Endpoints<'_>,
    path: &Path,
) -> anyhow::Result<DiffSummary> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = tempfile::NamedTempFile::new_in(dir)?;
    let mut writer = StatementWriter::new(BufWriter::new(file));
    sync.run(endpoints, &mut writer).await?;

    let (out, summary) = writer.finish()?;
    let file = out.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    info!(path = %path.display(), "Script written");
    Ok(summary)
}
