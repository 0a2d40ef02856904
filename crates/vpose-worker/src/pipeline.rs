//! Per-video pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tracing::Instrument;

use vpose_media::{ProcessorOutputs, VideoProcessor};
use vpose_models::{ArtifactCategory, ArtifactManifest, VideoId};
use vpose_storage::ArtifactStore;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::PipelineLogger;

/// Metric names recorded by the pipeline.
pub mod names {
    pub const ANALYSIS_DURATION_SECONDS: &str = "vpose_analysis_duration_seconds";
    pub const ANALYSES_COMPLETED_TOTAL: &str = "vpose_analyses_completed_total";
    pub const ANALYSES_FAILED_TOTAL: &str = "vpose_analyses_failed_total";
}

/// Turns one stored video into its four artifacts.
#[derive(Clone)]
pub struct VideoPipeline {
    store: ArtifactStore,
    processor: Arc<dyn VideoProcessor>,
    analysis_permits: Arc<Semaphore>,
}

impl VideoPipeline {
    /// Create a pipeline allowing at most `max_concurrent_analyses` processor
    /// calls at once.
    pub fn new(
        store: ArtifactStore,
        processor: Arc<dyn VideoProcessor>,
        max_concurrent_analyses: usize,
    ) -> Self {
        Self {
            store,
            processor,
            analysis_permits: Arc::new(Semaphore::new(max_concurrent_analyses.max(1))),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Deterministic output paths for a video.
    pub fn output_paths(&self, video_id: &VideoId) -> ProcessorOutputs {
        ProcessorOutputs::new(
            self.store.artifact_path(ArtifactCategory::Plot, video_id),
            self.store.artifact_path(ArtifactCategory::Ellipse, video_id),
            self.store.artifact_path(ArtifactCategory::Analysis, video_id),
            self.store.artifact_path(ArtifactCategory::JsonResult, video_id),
        )
    }

    /// Analyse one stored video and return its manifest.
    ///
    /// Artifacts written before a failure are left on disk.
    pub async fn process(
        &self,
        video_path: &Path,
        video_id: &VideoId,
    ) -> WorkerResult<ArtifactManifest> {
        let logger = PipelineLogger::new(video_id, "analyze_video");
        let outputs = self.output_paths(video_id);

        self.store.ensure_layout().await?;

        let _permit = self
            .analysis_permits
            .acquire()
            .await
            .map_err(|_| WorkerError::processing_failed("analysis slots closed"))?;

        logger.log_start(&format!("{} via {}", video_path.display(), self.processor.name()));
        let start = Instant::now();

        let result = self
            .processor
            .process_video(video_path, &outputs)
            .instrument(logger.create_span())
            .await;

        let elapsed = start.elapsed().as_secs_f64();
        histogram!(names::ANALYSIS_DURATION_SECONDS).record(elapsed);

        match result {
            Ok(()) => {
                counter!(names::ANALYSES_COMPLETED_TOTAL).increment(1);
                logger.log_completion(&format!("{:.1}s", elapsed));
                Ok(ArtifactManifest::for_video(video_id))
            }
            Err(e) => {
                counter!(names::ANALYSES_FAILED_TOTAL).increment(1);
                logger.log_error(&e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{store_in, FakeProcessor};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_process_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let pipeline = VideoPipeline::new(store.clone(), Arc::new(FakeProcessor::new()), 1);

        let input = dir.path().join("input.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();
        let id = VideoId::new();

        let manifest = pipeline.process(&input, &id).await.unwrap();

        assert_eq!(manifest, ArtifactManifest::for_video(&id));
        for (category, filename) in manifest.entries() {
            assert!(store.artifact_exists(category, filename).await);
        }
    }

    #[tokio::test]
    async fn test_output_paths_are_deterministic() {
        let dir = TempDir::new().unwrap();
        let pipeline = VideoPipeline::new(store_in(&dir), Arc::new(FakeProcessor::new()), 1);
        let id = VideoId::from_string("fixed");

        let a = pipeline.output_paths(&id);
        let b = pipeline.output_paths(&id);
        assert_eq!(a, b);
        assert!(a.elipsis.ends_with("elipsis/fixed_elipsis.png"));
        assert!(a.json_result.ends_with("json_results/fixed_result.json"));
    }

    #[tokio::test]
    async fn test_processor_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let pipeline = VideoPipeline::new(
            store_in(&dir),
            Arc::new(FakeProcessor::failing_on("broken")),
            1,
        );

        let input = dir.path().join("broken.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();

        let result = pipeline.process(&input, &VideoId::new()).await;
        assert!(matches!(result, Err(WorkerError::Media(_))));
    }
}
