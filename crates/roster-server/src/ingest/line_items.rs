//! Line item rows: `slug`, `label`, `uri`

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use super::ingester::{optional, required, IngestError, RowIngester};
use super::source::SourceRow;
use crate::db::LineItemRepository;
use crate::models::NewLineItem;

#[derive(Debug, Default)]
pub struct LineItemContext {
    existing: HashSet<String>,
    seen: HashSet<String>,
}

pub struct LineItemRowIngester {
    line_items: Arc<dyn LineItemRepository>,
}

impl LineItemRowIngester {
    pub fn new(line_items: Arc<dyn LineItemRepository>) -> Self {
        Self { line_items }
    }
}

#[async_trait]
impl RowIngester for LineItemRowIngester {
    type Context = LineItemContext;
    type Record = NewLineItem;

    fn type_name(&self) -> &'static str {
        "line-item"
    }

    async fn load_context(&self, rows: &[SourceRow]) -> Result<LineItemContext, IngestError> {
        let slugs: Vec<String> = rows
            .iter()
            .filter_map(|row| optional(row, "slug"))
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let existing = self
            .line_items
            .find_by_slugs(&slugs)
            .await?
            .into_iter()
            .map(|line_item| line_item.slug)
            .collect();

        Ok(LineItemContext {
            existing,
            seen: HashSet::new(),
        })
    }

    fn parse_row(
        &self,
        context: &mut LineItemContext,
        row: &SourceRow,
    ) -> Result<NewLineItem, String> {
        let slug = required(row, "slug")?;
        let label = required(row, "label")?;
        let uri = required(row, "uri")?;

        if context.existing.contains(slug) {
            return Err(format!("line item '{}' already exists", slug));
        }
        if !context.seen.insert(slug.to_string()) {
            return Err(format!("duplicate slug '{}' in file", slug));
        }

        Ok(NewLineItem {
            slug: slug.to_string(),
            label: label.to_string(),
            uri: uri.to_string(),
        })
    }

    async fn persist(&self, records: Vec<NewLineItem>) -> Result<usize, IngestError> {
        let written = self.line_items.insert_multiple_natively(&records).await?;
        Ok(written as usize)
    }
}
