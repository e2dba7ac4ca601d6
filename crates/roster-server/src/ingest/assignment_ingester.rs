//! All-or-nothing insertion of pending assignments
//!
//! Usernames are resolved to user ids in one lookup, then the whole batch is
//! written with a single multi-row insert. If any username is unknown, or the
//! lookup returns an incomplete record, nothing is written. Dry runs call
//! [`AssignmentIngester::resolve`] alone and fail the same way.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::{AssignmentRepository, UserRepository};
use crate::models::AssignmentCollection;

#[derive(Error, Debug)]
pub enum AssignmentIngesterError {
    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Invalid user data returned by the username lookup: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct AssignmentIngester {
    users: Arc<dyn UserRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignmentIngester {
    pub fn new(users: Arc<dyn UserRepository>, assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { users, assignments }
    }

    /// Resolve every username of the batch, setting each `user_id`.
    ///
    /// Nothing is written; the first incomplete lookup record or unknown
    /// username aborts. Returns the number of distinct users found.
    #[instrument(skip(self, collection), fields(count = collection.len()))]
    pub async fn resolve(
        &self,
        collection: &mut AssignmentCollection,
    ) -> Result<usize, AssignmentIngesterError> {
        if collection.is_empty() {
            return Ok(0);
        }

        let usernames = collection.usernames();
        let records = self.users.find_usernames(&usernames).await?;

        let mut user_ids: HashMap<String, i64> = HashMap::with_capacity(records.len());
        for record in records {
            match (record.id, record.username) {
                (Some(id), Some(username)) => {
                    user_ids.insert(username, id);
                },
                (id, username) => {
                    return Err(AssignmentIngesterError::InvalidData(format!(
                        "incomplete record (id: {:?}, username: {:?})",
                        id, username
                    )));
                },
            }
        }

        for assignment in collection.iter_mut() {
            let user_id = user_ids
                .get(&assignment.username)
                .copied()
                .ok_or_else(|| AssignmentIngesterError::UserNotFound(assignment.username.clone()))?;
            assignment.user_id = Some(user_id);
        }

        Ok(user_ids.len())
    }

    /// Resolve every username and insert the batch. Returns the number of
    /// assignments written.
    #[instrument(skip(self, collection), fields(count = collection.len()))]
    pub async fn ingest(
        &self,
        mut collection: AssignmentCollection,
    ) -> Result<usize, AssignmentIngesterError> {
        if collection.is_empty() {
            return Ok(0);
        }

        let users = self.resolve(&mut collection).await?;

        let assignments = collection.into_inner();
        self.assignments.insert_multiple_natively(&assignments).await?;

        info!(assignments = assignments.len(), users, "Assignments ingested");

        Ok(assignments.len())
    }
}
