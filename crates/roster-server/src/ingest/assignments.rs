//! Assignment rows: `username`, `lineItemSlug` and an optional `state`
//!
//! Line items are resolved per row. Users are resolved for the whole batch by
//! the [`AssignmentIngester`] at persist time, so one unknown username aborts
//! the write, and a dry run reports it the same way.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::assignment_ingester::AssignmentIngester;
use super::ingester::{optional, required, IngestError, RowIngester};
use super::source::SourceRow;
use crate::db::{AssignmentRepository, LineItemRepository, UserRepository};
use crate::models::{Assignment, AssignmentCollection, AssignmentState};

pub struct AssignmentRowIngester {
    line_items: Arc<dyn LineItemRepository>,
    ingester: AssignmentIngester,
}

impl AssignmentRowIngester {
    pub fn new(
        users: Arc<dyn UserRepository>,
        line_items: Arc<dyn LineItemRepository>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            line_items,
            ingester: AssignmentIngester::new(users, assignments),
        }
    }
}

#[async_trait]
impl RowIngester for AssignmentRowIngester {
    /// Line item id by slug
    type Context = HashMap<String, i64>;
    type Record = Assignment;

    fn type_name(&self) -> &'static str {
        "assignment"
    }

    async fn load_context(&self, rows: &[SourceRow]) -> Result<HashMap<String, i64>, IngestError> {
        let slugs: Vec<String> = rows
            .iter()
            .filter_map(|row| optional(row, "lineItemSlug"))
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        Ok(self
            .line_items
            .find_by_slugs(&slugs)
            .await?
            .into_iter()
            .map(|line_item| (line_item.slug, line_item.id))
            .collect())
    }

    fn parse_row(
        &self,
        line_items: &mut HashMap<String, i64>,
        row: &SourceRow,
    ) -> Result<Assignment, String> {
        let username = required(row, "username")?;
        let slug = required(row, "lineItemSlug")?;

        let line_item_id = *line_items
            .get(slug)
            .ok_or_else(|| format!("line item '{}' not found", slug))?;

        let state = match optional(row, "state") {
            Some(state) => state.parse::<AssignmentState>().map_err(|e| e.to_string())?,
            None => AssignmentState::Ready,
        };

        Ok(Assignment::pending(username, line_item_id, state))
    }

    async fn check(&self, records: &[Assignment]) -> Result<(), IngestError> {
        let mut collection: AssignmentCollection = records.iter().cloned().collect();
        self.ingester.resolve(&mut collection).await?;
        Ok(())
    }

    async fn persist(&self, records: Vec<Assignment>) -> Result<usize, IngestError> {
        let collection: AssignmentCollection = records.into_iter().collect();
        Ok(self.ingester.ingest(collection).await?)
    }
}
