//! Generic row ingestion
//!
//! A [`RowIngester`] turns CSV rows into records of one entity type. The
//! [`ingest`] runner drives it over a source:
//!
//! 1. every row is read; malformed rows become failures
//! 2. the ingester loads whatever lookup data it needs for the whole file
//! 3. each row is parsed on its own; a rejected row becomes a failure
//! 4. unless dry-running, the accepted records are persisted in one call;
//!    a dry run only runs the ingester's [`RowIngester::check`]
//!
//! Row failures never stop a run. Source, check and persistence errors do.
//! Rows are pulled from the source on the blocking thread pool.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::assignment_ingester::AssignmentIngesterError;
use super::result::{IngesterResult, IngesterResultFailure};
use super::source::{IngesterSource, SourceError, SourceRow};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Assignments(#[from] AssignmentIngesterError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Reading rows failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait RowIngester: Send + Sync {
    /// Lookup data shared by every row of a run
    type Context: Send;
    /// A validated row, ready to persist
    type Record: Send + Sync;

    /// Entity name used in reports
    fn type_name(&self) -> &'static str;

    async fn load_context(&self, rows: &[SourceRow]) -> Result<Self::Context, IngestError>;

    /// Validate one row. The error string becomes the failure reason.
    fn parse_row(
        &self,
        context: &mut Self::Context,
        row: &SourceRow,
    ) -> Result<Self::Record, String>;

    /// Run the batch-level validation `persist` would do, without writing.
    /// Called instead of `persist` on dry runs.
    async fn check(&self, _records: &[Self::Record]) -> Result<(), IngestError> {
        Ok(())
    }

    /// Write every accepted record. Returns the number of rows written.
    async fn persist(&self, records: Vec<Self::Record>) -> Result<usize, IngestError>;
}

/// A non-empty value of a required column
pub(crate) fn required<'r>(row: &'r SourceRow, column: &str) -> Result<&'r str, String> {
    match row.get(column) {
        None => Err(format!("missing column '{}'", column)),
        Some("") => Err(format!("'{}' is empty", column)),
        Some(value) => Ok(value),
    }
}

/// A value of an optional column, `None` when absent or empty
pub(crate) fn optional<'r>(row: &'r SourceRow, column: &str) -> Option<&'r str> {
    row.get(column).filter(|value| !value.is_empty())
}

/// Run `ingester` over every row of `source`
#[instrument(
    skip(ingester, source),
    fields(ingester = ingester.type_name(), source = source.name())
)]
pub async fn ingest<I>(
    ingester: &I,
    source: &dyn IngesterSource,
    dry_run: bool,
) -> Result<IngesterResult, IngestError>
where
    I: RowIngester + ?Sized,
{
    let mut rows = Vec::new();
    let mut failures = Vec::new();

    let csv_rows = source.read().await?;
    let items = tokio::task::spawn_blocking(move || csv_rows.collect::<Vec<_>>()).await?;

    for item in items {
        match item {
            Ok(row) => rows.push(row),
            Err(SourceError::MalformedRow {
                line_number,
                reason,
                data,
            }) => {
                warn!(line_number, %reason, "Skipping malformed row");
                failures.push(IngesterResultFailure::new(line_number, data, reason));
            },
            Err(err) => return Err(err.into()),
        }
    }

    let mut context = ingester.load_context(&rows).await?;
    let mut records = Vec::with_capacity(rows.len());

    for row in &rows {
        match ingester.parse_row(&mut context, row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!(line_number = row.line_number, %reason, "Row rejected");
                failures.push(IngesterResultFailure::new(row.line_number, row.to_map(), reason));
            },
        }
    }

    failures.sort_by_key(|failure| failure.line_number);
    let row_count = records.len();

    if dry_run {
        if !records.is_empty() {
            ingester.check(&records).await?;
        }
        info!(row_count, failures = failures.len(), "Dry run, nothing persisted");
    } else if !records.is_empty() {
        let written = ingester.persist(records).await?;
        info!(row_count, written, failures = failures.len(), "Rows persisted");
    }

    Ok(IngesterResult::new(ingester.type_name(), row_count)
        .with_dry_run(dry_run)
        .with_failures(failures))
}
