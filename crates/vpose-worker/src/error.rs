//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    Validation(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vpose_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vpose_media::MediaError),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn job_not_found(job_id: impl Into<String>) -> Self {
        Self::JobNotFound(job_id.into())
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, WorkerError::Validation(_) | WorkerError::JobNotFound(_))
    }
}
