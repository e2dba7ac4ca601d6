use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{expect_type, BulkOperationCollectionProcessor, OperationFailure};
use crate::bulk::{BulkOperation, BulkOperationCollection, BulkOperationType, BulkResult};
use crate::db::{AssignmentRepository, UserRepository};
use crate::models::AssignmentState;

/// Attribute carrying the target state
pub const STATE_ATTRIBUTE: &str = "state";

/// Moves every assignment of a user to a new state.
///
/// Only `cancelled` can be set this way.
pub struct BulkUpdateUsersAssignmentsStateProcessor {
    users: Arc<dyn UserRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl BulkUpdateUsersAssignmentsStateProcessor {
    pub fn new(users: Arc<dyn UserRepository>, assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { users, assignments }
    }

    #[instrument(skip(self, operation), fields(username = %operation.identifier(), dry_run = operation.is_dry_run()))]
    async fn process_operation(&self, operation: &BulkOperation) -> Result<(), OperationFailure> {
        expect_type(BulkOperationType::Update, operation.operation_type())?;

        let state = operation
            .attribute(STATE_ATTRIBUTE)
            .ok_or(OperationFailure::MissingAttribute(STATE_ATTRIBUTE))?
            .parse::<AssignmentState>()?;

        if state != AssignmentState::Cancelled {
            return Err(OperationFailure::UnsupportedState(state.to_string()));
        }

        let username = operation.identifier();
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| OperationFailure::UserNotFound(username.to_string()))?;

        if operation.is_dry_run() {
            debug!(user_id = user.id, "Dry run, assignments not cancelled");
            return Ok(());
        }

        let cancelled = self.assignments.cancel_all_for_user(user.id).await?;
        info!(user_id = user.id, cancelled, "Assignments cancelled");

        Ok(())
    }
}

#[async_trait]
impl BulkOperationCollectionProcessor for BulkUpdateUsersAssignmentsStateProcessor {
    fn name(&self) -> &'static str {
        "update-users-assignments-state"
    }

    async fn process(&self, collection: &BulkOperationCollection) -> BulkResult {
        let mut result = BulkResult::new();

        for operation in collection {
            match self.process_operation(operation).await {
                Ok(()) => {
                    result.add_success(operation);
                },
                Err(error) => {
                    warn!(identifier = operation.identifier(), %error, "Bulk state update failed");
                    result.add_failure(operation);
                },
            }
        }

        result
    }
}
