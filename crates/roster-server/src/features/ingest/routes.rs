//! CSV ingestion API routes
//!
//! - `POST /api/v1/ingest/:kind` - Ingest a CSV document, `kind` being
//!   `user`, `line-item` or `assignment`
//!
//! # Request Body
//!
//! ```json
//! {
//!   "source": "s3",
//!   "path": "s3://imports/2024/users.csv",
//!   "delimiter": ";",
//!   "headers": "firstRow",
//!   "dryRun": false
//! }
//! ```
//!
//! `source` defaults to `local`, `headers` to `firstRow` and `dryRun` to
//! `true`: nothing is written unless the caller asks for it.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use roster_common::delimiter::parse_delimiter;
use serde::Deserialize;
use serde_json::json;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::ingest::source::LOCAL_SOURCE;
use crate::ingest::{self, create_source, HeaderPolicy, IngesterKind, SourceError, SourceOptions};

pub fn ingest_routes() -> Router<FeatureState> {
    Router::new().route("/:kind", post(ingest_csv))
}

fn default_source() -> String {
    LOCAL_SOURCE.to_string()
}

fn default_dry_run() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default = "default_source")]
    pub source: String,
    pub path: String,
    pub delimiter: Option<String>,
    #[serde(default)]
    pub headers: HeaderPolicy,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

impl IngestRequest {
    fn source_options(&self, state: &FeatureState) -> Result<SourceOptions, SourceError> {
        let delimiter = match &self.delimiter {
            Some(delimiter) => parse_delimiter(delimiter)?,
            None => state.ingest.csv_delimiter,
        };

        let mut options = SourceOptions::new(self.path.clone())
            .delimiter(delimiter)
            .headers(self.headers);
        if let Some(storage) = &state.object_storage {
            options = options.object_storage(storage.clone());
        }
        Ok(options)
    }
}

/// `POST /api/v1/ingest/:kind`
///
/// - `200 OK` - Run finished; row failures are listed in the body
/// - `400 Bad Request` - Bad body, unknown source or invalid delimiter
/// - `404 Not Found` - Unknown ingester kind or missing local file
/// - `422 Unprocessable Entity` - An assignment references an unknown user
/// - `502 Bad Gateway` - The S3 object could not be read
#[tracing::instrument(skip(state, payload), fields(kind = %kind))]
async fn ingest_csv(
    State(state): State<FeatureState>,
    Path(kind): Path<String>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let kind: IngesterKind = kind.parse().map_err(AppError::NotFound)?;
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let source = create_source(&request.source, request.source_options(&state)?)?;
    let result = ingest::run(kind, &state.repos, source.as_ref(), request.dry_run).await?;

    tracing::info!(
        rows = result.row_count,
        failures = result.failures.len(),
        dry_run = result.dry_run,
        "Ingestion request processed"
    );

    let meta = json!({ "feedback": result.feedback() });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(result, meta))).into_response())
}
