pub mod routes;

pub use routes::{bulk_routes, BulkRequest};
