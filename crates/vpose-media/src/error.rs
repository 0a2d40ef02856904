//! Error types for the analysis adapter.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for analysis operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while analysing a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Analysis program not found: {0}")]
    ProcessorNotFound(String),

    #[error("Analysis failed: {message}")]
    ProcessorFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Analysis did not produce {0}")]
    MissingOutput(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an analysis failure error.
    pub fn processor_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessorFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
