//! Bulk assignment API routes
//!
//! - `POST /api/v1/bulk/assignments` - Create a fresh assignment per user
//! - `PATCH /api/v1/bulk/assignments` - Cancel users' assignments
//!
//! Both take the same body:
//!
//! ```json
//! {
//!   "dryRun": false,
//!   "operations": [
//!     {"identifier": "alice", "type": "create", "attributes": {"lineItemSlug": "math-101"}}
//!   ]
//! }
//! ```
//!
//! and answer with the bulk result:
//!
//! ```json
//! {"data": {"applied": true, "results": {"alice": true}}}
//! ```
//!
//! `applied` is false and the status is `207 Multi-Status` when any operation
//! failed; operations that succeeded stay applied.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::bulk::{
    process_in_batches, BulkCreateUsersAssignmentsProcessor, BulkOperation,
    BulkOperationCollection, BulkOperationCollectionProcessor,
    BulkUpdateUsersAssignmentsStateProcessor,
};
use crate::error::AppError;
use crate::features::FeatureState;

pub fn bulk_routes() -> Router<FeatureState> {
    Router::new().route(
        "/assignments",
        post(create_assignments).patch(update_assignments_state),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    #[serde(default)]
    pub dry_run: bool,
    pub operations: Vec<BulkOperation>,
}

impl BulkRequest {
    pub fn into_collection(self) -> Result<BulkOperationCollection, AppError> {
        if self.operations.is_empty() {
            return Err(AppError::BadRequest(
                "At least one operation is required".to_string(),
            ));
        }

        let mut collection = BulkOperationCollection::new();
        collection.set_dry_run(self.dry_run);
        for operation in self.operations {
            collection.add(operation);
        }
        Ok(collection)
    }
}

fn parse_request(
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<BulkOperationCollection, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    request.into_collection()
}

async fn run(
    state: &FeatureState,
    processor: &dyn BulkOperationCollectionProcessor,
    collection: &BulkOperationCollection,
    success: StatusCode,
) -> Response {
    let result = process_in_batches(processor, collection, state.ingest.bulk_batch_size)
        .await
        .merged();

    let status = if result.has_failures() {
        StatusCode::MULTI_STATUS
    } else {
        success
    };

    tracing::info!(
        operations = result.len(),
        failures = result.failures_count(),
        status = status.as_u16(),
        "Bulk request processed"
    );

    (status, Json(result)).into_response()
}

/// `POST /api/v1/bulk/assignments`
///
/// - `201 Created` - Every operation applied
/// - `207 Multi-Status` - At least one operation failed
/// - `400 Bad Request` - Malformed body or no operations
#[tracing::instrument(skip(state, payload))]
async fn create_assignments(
    State(state): State<FeatureState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let collection = parse_request(payload)?;
    let processor = BulkCreateUsersAssignmentsProcessor::new(
        state.repos.users.clone(),
        state.repos.line_items.clone(),
        state.repos.assignments.clone(),
    );

    Ok(run(&state, &processor, &collection, StatusCode::CREATED).await)
}

/// `PATCH /api/v1/bulk/assignments`
///
/// - `200 OK` - Every operation applied
/// - `207 Multi-Status` - At least one operation failed
/// - `400 Bad Request` - Malformed body or no operations
#[tracing::instrument(skip(state, payload))]
async fn update_assignments_state(
    State(state): State<FeatureState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let collection = parse_request(payload)?;
    let processor = BulkUpdateUsersAssignmentsStateProcessor::new(
        state.repos.users.clone(),
        state.repos.assignments.clone(),
    );

    Ok(run(&state, &processor, &collection, StatusCode::OK).await)
}
