use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{expect_type, BulkOperationCollectionProcessor, OperationFailure};
use crate::bulk::{BulkOperation, BulkOperationCollection, BulkOperationType, BulkResult};
use crate::db::{AssignmentRepository, LineItemRepository, UserRepository};

/// Attribute naming the line item to assign
pub const LINE_ITEM_SLUG_ATTRIBUTE: &str = "lineItemSlug";

/// Gives each user a fresh `ready` assignment.
///
/// The operation identifier is the username. The line item comes from the
/// `lineItemSlug` attribute, or else from the user's most recent assignment.
/// The user's open assignments are cancelled in the same transaction.
pub struct BulkCreateUsersAssignmentsProcessor {
    users: Arc<dyn UserRepository>,
    line_items: Arc<dyn LineItemRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl BulkCreateUsersAssignmentsProcessor {
    pub fn new(
        users: Arc<dyn UserRepository>,
        line_items: Arc<dyn LineItemRepository>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            users,
            line_items,
            assignments,
        }
    }

    #[instrument(skip(self, operation), fields(username = %operation.identifier(), dry_run = operation.is_dry_run()))]
    async fn process_operation(&self, operation: &BulkOperation) -> Result<(), OperationFailure> {
        expect_type(BulkOperationType::Create, operation.operation_type())?;

        let username = operation.identifier();
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| OperationFailure::UserNotFound(username.to_string()))?;

        let line_item_id = match operation.attribute(LINE_ITEM_SLUG_ATTRIBUTE) {
            Some(slug) => {
                self.line_items
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| OperationFailure::LineItemNotFound(slug.to_string()))?
                    .id
            },
            None => {
                self.assignments
                    .find_last_for_user(user.id)
                    .await?
                    .ok_or_else(|| OperationFailure::NoPreviousAssignment(username.to_string()))?
                    .line_item_id
            },
        };

        if operation.is_dry_run() {
            debug!(line_item_id, "Dry run, assignment not created");
            return Ok(());
        }

        let assignment_id = self.assignments.reassign(user.id, line_item_id).await?;
        info!(assignment_id, line_item_id, "Assignment created");

        Ok(())
    }
}

#[async_trait]
impl BulkOperationCollectionProcessor for BulkCreateUsersAssignmentsProcessor {
    fn name(&self) -> &'static str {
        "create-users-assignments"
    }

    async fn process(&self, collection: &BulkOperationCollection) -> BulkResult {
        let mut result = BulkResult::new();

        for operation in collection {
            match self.process_operation(operation).await {
                Ok(()) => {
                    result.add_success(operation);
                },
                Err(error) => {
                    warn!(identifier = operation.identifier(), %error, "Bulk assignment creation failed");
                    result.add_failure(operation);
                },
            }
        }

        result
    }
}
