//! Bulk operations on users' assignments
//!
//! Requests carry a list of [`BulkOperation`]s, collected into a
//! [`BulkOperationCollection`] and handed to a processor. The processor
//! answers with a [`BulkResult`] telling, per identifier, whether the
//! operation was applied.

pub mod collection;
pub mod operation;
pub mod processor;
pub mod result;

pub use collection::BulkOperationCollection;
pub use operation::{BulkOperation, BulkOperationError, BulkOperationType};
pub use processor::{
    process_in_batches, BulkCreateUsersAssignmentsProcessor, BulkOperationCollectionProcessor,
    BulkUpdateUsersAssignmentsStateProcessor, OperationFailure,
};
pub use result::{BulkResult, BulkResultCollection};
