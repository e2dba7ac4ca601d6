pub mod routes;

pub use routes::{ingest_routes, IngestRequest};
