//! Asynchronous pair jobs.
//!
//! A job is accepted once both videos are validated and stored; analysis then
//! runs in the background and the record is polled by job ID.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use vpose_models::{JobId, JobRecord, UploadedVideo};

use crate::error::{WorkerError, WorkerResult};
use crate::orchestrator::{AcceptedPair, PairOrchestrator};

/// In-memory store of job records.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    max_retained: usize,
}

impl JobRegistry {
    pub fn new(max_retained: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            max_retained: max_retained.max(1),
        }
    }

    /// Insert a record, evicting the oldest finished jobs once the registry is full.
    ///
    /// Jobs that are still submitted or running are never evicted.
    pub async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;

        while jobs.len() >= self.max_retained {
            let oldest = jobs
                .values()
                .filter(|job| job.status.is_terminal())
                .min_by_key(|job| job.finished_at.unwrap_or(job.submitted_at))
                .map(|job| job.job_id.clone());

            match oldest {
                Some(job_id) => {
                    debug!(job_id = %job_id, "Evicting finished job record");
                    jobs.remove(&job_id);
                }
                None => break,
            }
        }

        jobs.insert(record.job_id.clone(), record);
    }

    pub async fn get(&self, job_id: &JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Apply `f` to a stored record. Returns false if the job is unknown.
    pub async fn update<F>(&self, job_id: &JobId, f: F) -> bool
    where
        F: FnOnce(&mut JobRecord),
    {
        match self.jobs.write().await.get_mut(job_id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

/// Submits pairs for background processing and reports their status.
#[derive(Clone)]
pub struct PairJobService {
    orchestrator: Arc<PairOrchestrator>,
    registry: JobRegistry,
}

impl PairJobService {
    pub fn new(orchestrator: Arc<PairOrchestrator>, registry: JobRegistry) -> Self {
        Self {
            orchestrator,
            registry,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Validate and store both videos, then schedule the analysis.
    ///
    /// Validation and storage errors are returned directly; analysis errors
    /// end up in the job record.
    pub async fn submit(
        &self,
        video1: UploadedVideo,
        video2: UploadedVideo,
    ) -> WorkerResult<JobRecord> {
        let pair = self.orchestrator.accept_pair(video1, video2).await?;

        let record = JobRecord::submitted(
            JobId::new(),
            pair.video1_id.clone(),
            pair.video2_id.clone(),
        );
        let job_id = record.job_id.clone();
        self.registry.insert(record.clone()).await;

        info!(
            job_id = %job_id,
            video1_id = %pair.video1_id,
            video2_id = %pair.video2_id,
            "Pair job submitted"
        );

        let task = tokio::spawn(Self::run(
            Arc::clone(&self.orchestrator),
            self.registry.clone(),
            job_id.clone(),
            pair,
        ));

        // A panicking run must still leave the job in a terminal state
        let registry = self.registry.clone();
        tokio::spawn(async move {
            if let Err(e) = task.await {
                error!(job_id = %job_id, "Pair job aborted: {}", e);
                let message = format!("Pair job aborted: {}", e);
                registry
                    .update(&job_id, |job| {
                        if !job.status.is_terminal() {
                            job.fail(message);
                        }
                    })
                    .await;
            }
        });

        Ok(record)
    }

    async fn run(
        orchestrator: Arc<PairOrchestrator>,
        registry: JobRegistry,
        job_id: JobId,
        pair: AcceptedPair,
    ) {
        registry.update(&job_id, |job| job.start()).await;

        match orchestrator.process_accepted(&pair).await {
            Ok(result) => {
                info!(job_id = %job_id, "Pair job done");
                registry.update(&job_id, |job| job.complete(result)).await;
            }
            Err(e) => {
                error!(job_id = %job_id, "Pair job failed: {}", e);
                let message = e.to_string();
                registry.update(&job_id, |job| job.fail(message)).await;
            }
        }
    }

    pub async fn status(&self, job_id: &JobId) -> WorkerResult<JobRecord> {
        self.registry
            .get(job_id)
            .await
            .ok_or_else(|| WorkerError::job_not_found(job_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::VideoPipeline;
    use crate::test_support::{store_in, FakeProcessor};
    use std::time::Duration;
    use tempfile::TempDir;
    use vpose_media::{MediaResult, ProcessorOutputs, VideoProcessor};
    use vpose_models::{JobStatus, VideoId};

    fn upload(name: &str) -> UploadedVideo {
        UploadedVideo::new(
            b"video bytes".to_vec(),
            Some("video/mp4".to_string()),
            Some(name.to_string()),
        )
    }

    fn service(dir: &TempDir, processor: FakeProcessor) -> PairJobService {
        let pipeline = VideoPipeline::new(store_in(dir), Arc::new(processor), 2);
        PairJobService::new(
            Arc::new(PairOrchestrator::new(pipeline, false)),
            JobRegistry::new(10),
        )
    }

    async fn wait_terminal(service: &PairJobService, job_id: &JobId) -> JobRecord {
        for _ in 0..200 {
            let record = service.status(job_id).await.unwrap();
            if record.status.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", job_id);
    }

    #[tokio::test]
    async fn test_job_completes() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, FakeProcessor::new());

        let submitted = service.submit(upload("a.mp4"), upload("b.mp4")).await.unwrap();
        assert_eq!(submitted.status, JobStatus::Submitted);

        let record = wait_terminal(&service, &submitted.job_id).await;
        assert_eq!(record.status, JobStatus::Done);
        let result = record.result.unwrap();
        assert_eq!(result.video1_id, submitted.video1_id);
        assert_eq!(result.video2_id, submitted.video2_id);
        assert!(record.started_at.is_some());
        assert!(record.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_job_failure_is_recorded() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, FakeProcessor::failing_on("broken"));

        let submitted = service
            .submit(upload("fine.mp4"), upload("broken.mp4"))
            .await
            .unwrap();

        let record = wait_terminal(&service, &submitted.job_id).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.result.is_none());
        assert!(record
            .error_message
            .unwrap()
            .contains("no person detected"));
    }

    struct PanickingProcessor;

    #[async_trait::async_trait]
    impl VideoProcessor for PanickingProcessor {
        async fn process_video(
            &self,
            _input: &std::path::Path,
            _outputs: &ProcessorOutputs,
        ) -> MediaResult<()> {
            panic!("analysis crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_run_marks_job_failed() {
        let dir = TempDir::new().unwrap();
        let pipeline = VideoPipeline::new(store_in(&dir), Arc::new(PanickingProcessor), 2);
        let service = PairJobService::new(
            Arc::new(PairOrchestrator::new(pipeline, false)),
            JobRegistry::new(10),
        );

        let submitted = service.submit(upload("a.mp4"), upload("b.mp4")).await.unwrap();

        let record = wait_terminal(&service, &submitted.job_id).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error_message.unwrap().contains("aborted"));
    }

    #[tokio::test]
    async fn test_submit_rejects_non_video() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, FakeProcessor::new());

        let bad = UploadedVideo::new(b"x".to_vec(), Some("text/plain".to_string()), None);
        let result = service.submit(upload("a.mp4"), bad).await;

        assert!(matches!(result, Err(WorkerError::Validation(_))));
        assert!(service.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, FakeProcessor::new());

        let result = service.status(&JobId::from_string("missing")).await;
        assert!(matches!(result, Err(WorkerError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_registry_evicts_oldest_finished() {
        let registry = JobRegistry::new(2);

        let mut finished = JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new());
        finished.fail("boom");
        let running = JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new());
        let newest = JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new());

        registry.insert(finished.clone()).await;
        registry.insert(running.clone()).await;
        registry.insert(newest.clone()).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&finished.job_id).await.is_none());
        assert!(registry.get(&running.job_id).await.is_some());
        assert!(registry.get(&newest.job_id).await.is_some());
    }

    #[tokio::test]
    async fn test_registry_keeps_active_jobs_over_limit() {
        let registry = JobRegistry::new(1);

        registry
            .insert(JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new()))
            .await;
        registry
            .insert(JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new()))
            .await;

        assert_eq!(registry.len().await, 2);
    }
}
