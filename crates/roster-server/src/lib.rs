//! Roster Server Library
//!
//! Backend core of a roster service for an LTI testing platform: users, line
//! items (assessments) and the assignments linking them.
//!
//! # Overview
//!
//! - **Bulk operations** ([`bulk`]): batches of per-user operations, each
//!   validated and applied on its own, reported per identifier
//! - **CSV ingestion** ([`ingest`]): rows streamed from a local file or an S3
//!   object, parsed with per-row error isolation, written in single
//!   multi-row inserts
//! - **Persistence** ([`db`]): repository traits with Postgres implementations
//! - **Storage** ([`storage`]): S3 compatible object access
//! - **HTTP** ([`api`], [`features`]): axum routes exposing the above
//!
//! # Example
//!
//! ```no_run
//! use roster_server::{api, config::Config, db, features::FeatureState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let state = FeatureState::new(db::Repositories::postgres(pool.clone())).with_db(pool);
//!     let app = api::create_router(state);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bulk;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod models;
pub mod storage;

pub use error::AppError;
