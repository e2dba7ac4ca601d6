//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::ingest::{AssignmentIngesterError, IngestError, SourceError};

/// Errors surfaced by request handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            AppError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "STORAGE_ERROR"),
            AppError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            AppError::Internal(_) | AppError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
        }
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::FileNotFound(_) => AppError::NotFound(err.to_string()),
            SourceError::S3Access { .. } => AppError::BadGateway(err.to_string()),
            SourceError::MissingObjectStorage => AppError::ServiceUnavailable(err.to_string()),
            SourceError::Io(_) => AppError::Internal(err.to_string()),
            SourceError::MalformedRow { .. }
            | SourceError::UnknownSource(_)
            | SourceError::InvalidDelimiter(_)
            | SourceError::NotConfigured(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Source(source) => source.into(),
            IngestError::Assignments(AssignmentIngesterError::UserNotFound(_)) => {
                AppError::Unprocessable(err.to_string())
            },
            IngestError::Assignments(AssignmentIngesterError::Database(e))
            | IngestError::Database(e) => AppError::Database(e),
            IngestError::Assignments(AssignmentIngesterError::InvalidData(_))
            | IngestError::PasswordHash(_)
            | IngestError::Task(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            },
            AppError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                message.clone()
            },
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
