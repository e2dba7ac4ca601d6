//! Roster Ingest - command line CSV ingestion
//!
//! ```text
//! roster-ingest user ./users.csv --delimiter ';' --force
//! roster-ingest assignment s3://imports/assignments.csv --source s3
//! ```
//!
//! Runs are dry unless `--force` is given. The exit code is 0 when every row
//! was accepted and 1 otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::delimiter::{display_delimiter, parse_delimiter};
use roster_common::logging::{init_logging, LogConfig, LogLevel};
use roster_server::{
    config::Config,
    db,
    ingest::{self, create_source, HeaderPolicy, IngesterKind, IngesterResult, SourceOptions},
    storage::{config::StorageConfig, Storage},
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "roster-ingest")]
#[command(author, version, about = "Ingest users, line items or assignments from CSV")]
struct Cli {
    /// What the file contains: user, line-item or assignment
    kind: IngesterKind,

    /// Local path, or S3 key / s3://bucket/key with `--source s3`
    path: String,

    /// Where to read the file from
    #[arg(short, long, default_value = "local")]
    source: String,

    /// Field delimiter, `tab` for tab separated files
    #[arg(short, long, env = "ROSTER_CSV_DELIMITER", default_value = ",")]
    delimiter: String,

    /// The first row is data, not column names
    #[arg(long)]
    no_header: bool,

    /// Write to the database instead of a dry run
    #[arg(short, long)]
    force: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("roster-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let delimiter = parse_delimiter(&cli.delimiter)?;
    let headers = if cli.no_header {
        HeaderPolicy::None
    } else {
        HeaderPolicy::FirstRow
    };

    let config = Config::load()?;
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;
    let repos = db::Repositories::postgres(pool);

    let mut options = SourceOptions::new(cli.path.clone())
        .delimiter(delimiter)
        .headers(headers);
    if let Some(storage_config) = StorageConfig::from_env() {
        options = options.object_storage(Arc::new(Storage::new(storage_config)));
    }

    let source = create_source(&cli.source, options)?;

    info!(
        kind = %cli.kind,
        source = source.name(),
        path = %cli.path,
        delimiter = %display_delimiter(delimiter),
        dry_run = !cli.force,
        "Starting ingestion"
    );

    let result = ingest::run(cli.kind, &repos, source.as_ref(), !cli.force)
        .await
        .with_context(|| format!("Ingestion of {} failed", cli.path))?;

    report(&result);

    if result.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn report(result: &IngesterResult) {
    if result.dry_run {
        println!("[dry run] {}", result.feedback());
    } else {
        println!("{}", result.feedback());
    }

    for failure in &result.failures {
        println!("line {}: {}", failure.line_number, failure.reason);
    }
}
