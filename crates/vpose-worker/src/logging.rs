//! Structured per-video logging.
//!
//! Keeps the video ID and operation attached to every line emitted while a
//! video moves through the pipeline.

use tracing::{error, info, Span};
use vpose_models::VideoId;

/// Logger carrying the video ID and operation name.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    video_id: String,
    operation: String,
}

impl PipelineLogger {
    /// Create a new logger for a specific video and operation.
    pub fn new(video_id: &VideoId, operation: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Started: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span attached to the analysis call, so processor output inherits the fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "video",
            video_id = %self.video_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let id = VideoId::new();
        let logger = PipelineLogger::new(&id, "analyze_video");

        assert_eq!(logger.video_id(), id.as_str());
        assert_eq!(logger.operation(), "analyze_video");
    }
}
