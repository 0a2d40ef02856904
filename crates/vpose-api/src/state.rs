//! Application state.

use std::sync::Arc;

use vpose_media::{CommandProcessor, ProcessorConfig, VideoProcessor};
use vpose_storage::{ArtifactStore, StorageConfig};
use vpose_worker::{JobRegistry, PairJobService, PairOrchestrator, VideoPipeline, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: ArtifactStore,
    pub orchestrator: Arc<PairOrchestrator>,
    pub jobs: PairJobService,
    /// Program checked by the readiness probe, if analyses run out of process
    pub processor_program: Option<String>,
}

impl AppState {
    /// Create new application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage_config = StorageConfig::from_env();
        let processor_config = ProcessorConfig::from_env();
        let worker_config = WorkerConfig::from_env();

        let program = processor_config.program.clone();
        let processor = Arc::new(CommandProcessor::new(processor_config));

        let state = Self::with_processor(
            config,
            storage_config,
            worker_config,
            processor,
            Some(program),
        );
        state.store.ensure_layout().await?;

        Ok(state)
    }

    /// Build state around an existing processor.
    pub fn with_processor(
        config: ApiConfig,
        storage_config: StorageConfig,
        worker_config: WorkerConfig,
        processor: Arc<dyn VideoProcessor>,
        processor_program: Option<String>,
    ) -> Self {
        let store = ArtifactStore::new(storage_config);
        let pipeline = VideoPipeline::new(
            store.clone(),
            processor,
            worker_config.max_concurrent_analyses,
        );
        let orchestrator = Arc::new(PairOrchestrator::new(
            pipeline,
            worker_config.pair_concurrent,
        ));
        let jobs = PairJobService::new(
            Arc::clone(&orchestrator),
            JobRegistry::new(worker_config.max_retained_jobs),
        );

        Self {
            config,
            store,
            orchestrator,
            jobs,
            processor_program,
        }
    }
}
