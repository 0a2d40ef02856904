use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use vpose_media::{MediaError, MediaResult, ProcessorOutputs, VideoProcessor};
use vpose_storage::{ArtifactStore, StorageConfig};

pub fn store_in(dir: &TempDir) -> ArtifactStore {
    ArtifactStore::new(StorageConfig::under_root(dir.path()))
}

/// Writes small placeholder outputs. Inputs whose path contains the failure
/// marker get a plot only, then an error.
pub struct FakeProcessor {
    fail_marker: Option<String>,
    calls: AtomicUsize,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self {
            fail_marker: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProcessor for FakeProcessor {
    async fn process_video(&self, input: &Path, outputs: &ProcessorOutputs) -> MediaResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .fail_marker
            .as_deref()
            .map(|m| input.to_string_lossy().contains(m))
            .unwrap_or(false);

        if failing {
            tokio::fs::write(&outputs.plot, b"partial").await?;
            return Err(MediaError::processor_failed("no person detected", None, Some(1)));
        }

        for path in outputs.paths() {
            tokio::fs::write(path, b"artifact").await?;
        }
        Ok(())
    }
}
