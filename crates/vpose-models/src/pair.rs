//! Pair results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ArtifactCategory, ArtifactManifest, VideoId};

/// Outcome of processing both videos of one pair request.
///
/// Only ever built when both per-video runs succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PairResult {
    pub video1_id: VideoId,
    pub video2_id: VideoId,
    pub manifest1: ArtifactManifest,
    pub manifest2: ArtifactManifest,
}

impl PairResult {
    pub fn new(
        video1_id: VideoId,
        manifest1: ArtifactManifest,
        video2_id: VideoId,
        manifest2: ArtifactManifest,
    ) -> Self {
        Self {
            video1_id,
            video2_id,
            manifest1,
            manifest2,
        }
    }

    /// Link to the structured result of the first video.
    pub fn json1_link(&self) -> String {
        self.manifest1.link(ArtifactCategory::JsonResult)
    }

    /// Link to the structured result of the second video.
    pub fn json2_link(&self) -> String {
        self.manifest2.link(ArtifactCategory::JsonResult)
    }
}
