//! Domain entities
//!
//! Users, line items and the assignments linking them. Rows are mapped by hand
//! from `sqlx` results in the `db` module so these types stay free of database
//! derives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building domain values from raw input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid assignment state '{0}': expected ready, started, completed or cancelled")]
    InvalidState(String),
}

/// A registered test taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// A user waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub group_id: Option<String>,
}

/// An assessment users can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub slug: String,
    pub label: String,
    pub uri: String,
}

/// A line item waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub slug: String,
    pub label: String,
    pub uri: String,
}

/// Lifecycle state of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentState {
    #[default]
    Ready,
    Started,
    Completed,
    Cancelled,
}

impl AssignmentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentState::Ready => "ready",
            AssignmentState::Started => "started",
            AssignmentState::Completed => "completed",
            AssignmentState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(AssignmentState::Ready),
            "started" => Ok(AssignmentState::Started),
            "completed" => Ok(AssignmentState::Completed),
            "cancelled" => Ok(AssignmentState::Cancelled),
            other => Err(ModelError::InvalidState(other.to_string())),
        }
    }
}

/// A user assigned to a line item
///
/// `id` is absent until the row is stored. `user_id` is resolved from the
/// username during ingestion; only assignments with a resolved user are
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub id: Option<i64>,
    pub state: AssignmentState,
    #[serde(rename = "lineItemId")]
    pub line_item_id: i64,
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

impl Assignment {
    /// A pending assignment for `username`, not yet linked to a stored user
    pub fn pending(username: impl Into<String>, line_item_id: i64, state: AssignmentState) -> Self {
        Self {
            id: None,
            state,
            line_item_id,
            username: username.into(),
            user_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Ordered batch of pending assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentCollection {
    assignments: Vec<Assignment>,
}

impl AssignmentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, assignment: Assignment) -> &mut Self {
        self.assignments.push(assignment);
        self
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Assignment> {
        self.assignments.iter_mut()
    }

    /// Distinct usernames referenced by the batch, sorted
    pub fn usernames(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|a| a.username.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn into_inner(self) -> Vec<Assignment> {
        self.assignments
    }
}

impl FromIterator<Assignment> for AssignmentCollection {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        Self {
            assignments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AssignmentCollection {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_state_round_trips_through_text() {
        for state in [
            AssignmentState::Ready,
            AssignmentState::Started,
            AssignmentState::Completed,
            AssignmentState::Cancelled,
        ] {
            assert_eq!(state.as_str().parse::<AssignmentState>(), Ok(state));
        }
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        assert_eq!(
            "Cancelled".parse::<AssignmentState>(),
            Err(ModelError::InvalidState("Cancelled".to_string()))
        );
        assert!("".parse::<AssignmentState>().is_err());
    }

    #[test]
    fn test_collection_usernames_are_distinct() {
        let collection: AssignmentCollection = [
            Assignment::pending("bob", 1, AssignmentState::Ready),
            Assignment::pending("alice", 1, AssignmentState::Ready),
            Assignment::pending("bob", 2, AssignmentState::Started),
        ]
        .into_iter()
        .collect();

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.usernames(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_pending_assignment_is_unresolved() {
        let assignment = Assignment::pending("alice", 7, AssignmentState::default());
        assert_eq!(assignment.state, AssignmentState::Ready);
        assert!(assignment.id.is_none());
        assert!(!assignment.is_resolved());
    }
}
