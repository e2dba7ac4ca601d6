//! Bulk operation processors
//!
//! A processor validates and executes every operation of a collection on its
//! own. A failing operation is recorded as `false` and the run carries on;
//! successful operations are persisted one by one, so a run may be partially
//! applied.

mod create_assignments;
mod update_assignments_state;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument};

use super::collection::BulkOperationCollection;
use super::operation::BulkOperationType;
use super::result::{BulkResult, BulkResultCollection};
use crate::models::ModelError;

pub use create_assignments::BulkCreateUsersAssignmentsProcessor;
pub use update_assignments_state::BulkUpdateUsersAssignmentsStateProcessor;

/// Why a single operation was not applied
#[derive(Error, Debug)]
pub enum OperationFailure {
    #[error("Operation type '{actual}' is not supported here, expected '{expected}'")]
    UnsupportedType {
        expected: BulkOperationType,
        actual: BulkOperationType,
    },

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Line item '{0}' not found")]
    LineItemNotFound(String),

    #[error("User '{0}' has no previous assignment to take a line item from")]
    NoPreviousAssignment(String),

    #[error("Missing attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    InvalidState(#[from] ModelError),

    #[error("State '{0}' cannot be set in bulk, only 'cancelled' is allowed")]
    UnsupportedState(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BulkOperationCollectionProcessor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Process every operation; one result entry per identifier
    async fn process(&self, collection: &BulkOperationCollection) -> BulkResult;
}

/// Process `collection` in consecutive batches of at most `batch_size` operations
#[instrument(skip(processor, collection), fields(processor = processor.name(), operations = collection.len()))]
pub async fn process_in_batches(
    processor: &dyn BulkOperationCollectionProcessor,
    collection: &BulkOperationCollection,
    batch_size: usize,
) -> BulkResultCollection {
    let mut results = BulkResultCollection::new();

    for batch in collection.chunks(batch_size) {
        results.add(processor.process(&batch).await);
    }

    info!(
        batches = results.len(),
        failures = results.failures_count(),
        "Bulk processing finished"
    );

    results
}

/// Fail unless `operation_type` is the one the processor handles
fn expect_type(
    expected: BulkOperationType,
    actual: BulkOperationType,
) -> Result<(), OperationFailure> {
    if expected == actual {
        Ok(())
    } else {
        Err(OperationFailure::UnsupportedType { expected, actual })
    }
}
