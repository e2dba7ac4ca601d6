//! HTTP feature slices
//!
//! - **bulk**: bulk creation and cancellation of users' assignments
//! - **ingest**: CSV ingestion of users, line items and assignments
//!
//! Each feature exposes a `*_routes()` function returning a router over the
//! shared [`FeatureState`].

pub mod bulk;
pub mod ingest;

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::IngestConfig;
use crate::db::Repositories;
use crate::storage::ObjectStorage;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub repos: Repositories,
    /// Backs the `s3` ingestion source when configured
    pub object_storage: Option<Arc<dyn ObjectStorage>>,
    pub ingest: IngestConfig,
    /// Pool used by the health check, absent when running on fakes
    pub db: Option<PgPool>,
}

impl FeatureState {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            object_storage: None,
            ingest: IngestConfig::default(),
            db: None,
        }
    }

    pub fn with_object_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.object_storage = Some(storage);
        self
    }

    pub fn with_ingest_config(mut self, config: IngestConfig) -> Self {
        self.ingest = config;
        self
    }

    pub fn with_db(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}

/// All feature routes, to be nested under `/api/v1`
///
/// - `/bulk` - Bulk assignment operations
/// - `/ingest` - CSV ingestion
pub fn routes() -> Router<FeatureState> {
    Router::new()
        .nest("/bulk", bulk::bulk_routes())
        .nest("/ingest", ingest::ingest_routes())
}
