//! Pair orchestration.

use std::path::PathBuf;

use tracing::{error, info};

use vpose_models::{PairResult, UploadedVideo, VideoId};
use vpose_storage::ArtifactStore;

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::VideoPipeline;

/// A validated pair whose raw videos are already stored.
#[derive(Debug, Clone)]
pub struct AcceptedPair {
    pub video1_id: VideoId,
    pub video1_path: PathBuf,
    pub video2_id: VideoId,
    pub video2_path: PathBuf,
}

/// Runs the per-video pipeline for both videos of a request.
#[derive(Clone)]
pub struct PairOrchestrator {
    store: ArtifactStore,
    pipeline: VideoPipeline,
    concurrent: bool,
}

impl PairOrchestrator {
    pub fn new(pipeline: VideoPipeline, concurrent: bool) -> Self {
        Self {
            store: pipeline.store().clone(),
            pipeline,
            concurrent,
        }
    }

    /// Both uploads must declare a `video/*` media type.
    pub fn validate(video1: &UploadedVideo, video2: &UploadedVideo) -> WorkerResult<()> {
        for (field, video) in [("file1", video1), ("file2", video2)] {
            if !video.is_video() {
                return Err(WorkerError::validation(format!(
                    "Files must be videos: {} has type {}",
                    field,
                    video.content_type.as_deref().unwrap_or("unknown")
                )));
            }
        }
        Ok(())
    }

    /// Validate both uploads, then store them under fresh video IDs.
    ///
    /// Nothing is written when validation fails.
    pub async fn accept_pair(
        &self,
        video1: UploadedVideo,
        video2: UploadedVideo,
    ) -> WorkerResult<AcceptedPair> {
        Self::validate(&video1, &video2)?;

        let video1_id = VideoId::new();
        let video2_id = VideoId::new();

        let video1_path = self.store.persist_upload(&video1_id, &video1).await?;
        let video2_path = self.store.persist_upload(&video2_id, &video2).await?;

        info!(
            video1_id = %video1_id,
            video2_id = %video2_id,
            "Videos saved: {}, {}",
            video1_path.display(),
            video2_path.display()
        );

        Ok(AcceptedPair {
            video1_id,
            video1_path,
            video2_id,
            video2_path,
        })
    }

    /// Analyse both stored videos. Fails as a whole if either video fails.
    pub async fn process_accepted(&self, pair: &AcceptedPair) -> WorkerResult<PairResult> {
        let (manifest1, manifest2) = if self.concurrent {
            // Both runs complete before results are inspected; nothing is cancelled.
            let (r1, r2) = tokio::join!(
                self.pipeline.process(&pair.video1_path, &pair.video1_id),
                self.pipeline.process(&pair.video2_path, &pair.video2_id),
            );
            (r1?, r2?)
        } else {
            let m1 = self
                .pipeline
                .process(&pair.video1_path, &pair.video1_id)
                .await?;
            let m2 = self
                .pipeline
                .process(&pair.video2_path, &pair.video2_id)
                .await?;
            (m1, m2)
        };

        Ok(PairResult::new(
            pair.video1_id.clone(),
            manifest1,
            pair.video2_id.clone(),
            manifest2,
        ))
    }

    /// Validate, store and analyse a pair of uploads.
    pub async fn handle_upload_pair(
        &self,
        video1: UploadedVideo,
        video2: UploadedVideo,
    ) -> WorkerResult<PairResult> {
        let pair = self.accept_pair(video1, video2).await?;

        self.process_accepted(&pair).await.map_err(|e| {
            error!(
                video1_id = %pair.video1_id,
                video2_id = %pair.video2_id,
                "Error processing video pair: {}", e
            );
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{store_in, FakeProcessor};
    use std::sync::Arc;
    use tempfile::TempDir;
    use vpose_models::ArtifactCategory;

    fn upload(content_type: &str, name: &str) -> UploadedVideo {
        UploadedVideo::new(
            b"video bytes".to_vec(),
            Some(content_type.to_string()),
            Some(name.to_string()),
        )
    }

    fn orchestrator(
        dir: &TempDir,
        processor: Arc<FakeProcessor>,
        concurrent: bool,
    ) -> PairOrchestrator {
        PairOrchestrator::new(VideoPipeline::new(store_in(dir), processor, 2), concurrent)
    }

    async fn file_count(dir: &std::path::Path) -> usize {
        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
            while let Ok(Some(_)) = entries.next_entry().await {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_pair_produces_all_artifacts() {
        for concurrent in [false, true] {
            let dir = TempDir::new().unwrap();
            let orchestrator = orchestrator(&dir, Arc::new(FakeProcessor::new()), concurrent);

            let result = orchestrator
                .handle_upload_pair(upload("video/mp4", "a.mp4"), upload("video/webm", "b.webm"))
                .await
                .unwrap();

            assert_ne!(result.video1_id, result.video2_id);
            let store = store_in(&dir);
            for manifest in [&result.manifest1, &result.manifest2] {
                for (category, filename) in manifest.entries() {
                    assert!(store.artifact_exists(category, filename).await);
                }
            }
            assert_eq!(
                result.json1_link(),
                format!("/results/json/{}_result.json", result.video1_id)
            );
            assert_eq!(file_count(&store.config().upload_dir).await, 2);
        }
    }

    #[tokio::test]
    async fn test_rejects_non_video_without_writing() {
        let dir = TempDir::new().unwrap();
        let processor = Arc::new(FakeProcessor::new());
        let orchestrator = orchestrator(&dir, Arc::clone(&processor), false);

        let result = orchestrator
            .handle_upload_pair(upload("video/mp4", "a.mp4"), upload("image/png", "b.png"))
            .await;

        assert!(matches!(result, Err(WorkerError::Validation(_))));
        assert!(result.unwrap_err().is_client_error());
        assert_eq!(processor.calls(), 0);

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none(), "no files expected");
    }

    #[tokio::test]
    async fn test_first_video_failure_fails_pair() {
        for concurrent in [false, true] {
            let dir = TempDir::new().unwrap();
            let processor = Arc::new(FakeProcessor::failing_on("broken"));
            let orchestrator = orchestrator(&dir, Arc::clone(&processor), concurrent);

            let result = orchestrator
                .handle_upload_pair(
                    upload("video/mp4", "broken.mp4"),
                    upload("video/mp4", "fine.mp4"),
                )
                .await;

            assert!(matches!(result, Err(WorkerError::Media(_))));
            let expected_calls = if concurrent { 2 } else { 1 };
            assert_eq!(processor.calls(), expected_calls);
        }
    }

    #[tokio::test]
    async fn test_second_video_failure_fails_pair() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, Arc::new(FakeProcessor::failing_on("broken")), true);

        let result = orchestrator
            .handle_upload_pair(
                upload("video/mp4", "fine.mp4"),
                upload("video/mp4", "broken.mp4"),
            )
            .await;

        assert!(result.is_err());

        // The first video's artifacts stay on disk; the pair is still a failure.
        let plots = store_in(&dir)
            .list_category(ArtifactCategory::Plot)
            .await
            .unwrap();
        assert_eq!(plots.len(), 2);
    }
}
