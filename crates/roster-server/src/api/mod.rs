pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::features::{self, FeatureState};

/// Build the application router: `/health` plus every feature under `/api/v1`
pub fn create_router(state: FeatureState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", features::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health(State(state): State<FeatureState>) -> Response {
    let Some(pool) = &state.db else {
        return (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response();
    };

    match db::health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unreachable"
                })),
            )
                .into_response()
        },
    }
}
