//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use vpose_media::MediaError;
use vpose_storage::StorageError;
use vpose_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Error processing video: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// A request the body extractors refused, keeping their status code.
    pub fn rejected(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: detail.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Processing(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::not_found("File not found"),
            StorageError::InvalidKey(_) => ApiError::bad_request(e.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::Validation(msg) => ApiError::BadRequest(msg),
            WorkerError::JobNotFound(id) => ApiError::not_found(format!("Job not found: {}", id)),
            WorkerError::Media(MediaError::ProcessorFailed { message, .. }) => {
                ApiError::Processing(message)
            }
            WorkerError::Media(media) => ApiError::processing(media.to_string()),
            WorkerError::ProcessingFailed(msg) => ApiError::Processing(msg),
            WorkerError::Storage(storage) => ApiError::processing(storage.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("{}", self);
        }

        let internal = matches!(self, ApiError::Internal(_));
        let mut response = (status, Json(ErrorResponse { detail: self.to_string() })).into_response();
        if internal {
            response.extensions_mut().insert(InternalErrorDetail);
        }
        response
    }
}

/// Marks responses whose detail must not leave the server in production.
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorDetail;

/// Generic body used in place of internal error details.
pub fn redacted_internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: "An internal error occurred".to_string(),
        }),
    )
        .into_response()
}
