//! Line item storage

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::instrument;

use crate::models::{LineItem, NewLineItem};

#[async_trait]
pub trait LineItemRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> sqlx::Result<Option<LineItem>>;

    async fn find_by_slugs(&self, slugs: &[String]) -> sqlx::Result<Vec<LineItem>>;

    /// Insert all line items in a single statement
    async fn insert_multiple_natively(&self, line_items: &[NewLineItem]) -> sqlx::Result<u64>;
}

pub struct PgLineItemRepository {
    pool: PgPool,
}

impl PgLineItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn line_item_from_row(row: &PgRow) -> sqlx::Result<LineItem> {
    Ok(LineItem {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        label: row.try_get("label")?,
        uri: row.try_get("uri")?,
    })
}

#[async_trait]
impl LineItemRepository for PgLineItemRepository {
    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> sqlx::Result<Option<LineItem>> {
        sqlx::query("SELECT id, slug, label, uri FROM line_items WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(line_item_from_row)
            .transpose()
    }

    #[instrument(skip(self, slugs), fields(count = slugs.len()))]
    async fn find_by_slugs(&self, slugs: &[String]) -> sqlx::Result<Vec<LineItem>> {
        if slugs.is_empty() {
            return Ok(vec![]);
        }

        sqlx::query("SELECT id, slug, label, uri FROM line_items WHERE slug = ANY($1)")
            .bind(slugs)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(line_item_from_row)
            .collect()
    }

    #[instrument(skip(self, line_items), fields(count = line_items.len()))]
    async fn insert_multiple_natively(&self, line_items: &[NewLineItem]) -> sqlx::Result<u64> {
        if line_items.is_empty() {
            return Ok(0);
        }

        let slugs: Vec<String> = line_items.iter().map(|l| l.slug.clone()).collect();
        let labels: Vec<String> = line_items.iter().map(|l| l.label.clone()).collect();
        let uris: Vec<String> = line_items.iter().map(|l| l.uri.clone()).collect();

        let result = sqlx::query(
            "INSERT INTO line_items (slug, label, uri) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[])",
        )
        .bind(&slugs)
        .bind(&labels)
        .bind(&uris)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
