//! Processor contract.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::MediaResult;

/// Where the analysis must write its four outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorOutputs {
    /// Movement plot (PNG)
    pub plot: PathBuf,
    /// Ellipse overlay (PNG)
    pub elipsis: PathBuf,
    /// Analysis text
    pub analysis: PathBuf,
    /// Structured JSON result
    pub json_result: PathBuf,
}

impl ProcessorOutputs {
    pub fn new(
        plot: impl Into<PathBuf>,
        elipsis: impl Into<PathBuf>,
        analysis: impl Into<PathBuf>,
        json_result: impl Into<PathBuf>,
    ) -> Self {
        Self {
            plot: plot.into(),
            elipsis: elipsis.into(),
            analysis: analysis.into(),
            json_result: json_result.into(),
        }
    }

    /// All output paths.
    pub fn paths(&self) -> [&Path; 4] {
        [&self.plot, &self.elipsis, &self.analysis, &self.json_result]
    }
}

/// The external motion/pose analysis routine.
///
/// Implementations write all four outputs and return `Ok(())`, or fail.
/// After a failure the outputs may be missing or inconsistent. Callers
/// create the output directories beforehand.
#[async_trait]
pub trait VideoProcessor: Send + Sync {
    /// Analyse `input`, writing every file named in `outputs`.
    async fn process_video(&self, input: &Path, outputs: &ProcessorOutputs) -> MediaResult<()>;

    /// Short name used in logs and metrics.
    fn name(&self) -> &str {
        "processor"
    }
}
