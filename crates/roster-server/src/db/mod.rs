//! Persistence layer
//!
//! Repository traits used by the bulk processors and ingesters, plus their
//! Postgres implementations. Handlers and ingesters only ever see the traits
//! through [`Repositories`], which keeps the core testable with in-memory fakes.

pub mod assignments;
pub mod line_items;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;

pub use assignments::{AssignmentRepository, PgAssignmentRepository};
pub use line_items::{LineItemRepository, PgLineItemRepository};
pub use users::{PgUserRepository, UserRepository, UsernameRecord};

/// Create the Postgres connection pool
pub async fn create_pool(config: &DatabaseConfig) -> sqlx::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> sqlx::Result<()> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// The repository set shared by handlers, processors and ingesters
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub line_items: Arc<dyn LineItemRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
}

impl Repositories {
    /// Postgres backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            line_items: Arc::new(PgLineItemRepository::new(pool.clone())),
            assignments: Arc::new(PgAssignmentRepository::new(pool)),
        }
    }
}
