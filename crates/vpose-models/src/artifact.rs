//! Artifact categories and per-video manifests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::VideoId;

/// Public route prefix under which artifacts are served.
pub const RESULTS_ROUTE_PREFIX: &str = "/results";

/// The four kinds of output produced for every analysed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    /// Movement plot image
    Plot,
    /// Ellipse overlay image
    Ellipse,
    /// Human-readable analysis text
    Analysis,
    /// Structured JSON result
    JsonResult,
}

impl ArtifactCategory {
    /// All categories, in manifest order.
    pub const ALL: [ArtifactCategory; 4] = [
        ArtifactCategory::Plot,
        ArtifactCategory::Ellipse,
        ArtifactCategory::Analysis,
        ArtifactCategory::JsonResult,
    ];

    /// Suffix appended to the video ID to form the artifact filename.
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            ArtifactCategory::Plot => "plot.png",
            ArtifactCategory::Ellipse => "elipsis.png",
            ArtifactCategory::Analysis => "analysis.txt",
            ArtifactCategory::JsonResult => "result.json",
        }
    }

    /// Path segment used by the retrieval route.
    pub fn url_segment(&self) -> &'static str {
        match self {
            ArtifactCategory::Plot => "plot",
            ArtifactCategory::Ellipse => "elipsis",
            ArtifactCategory::Analysis => "analysis",
            ArtifactCategory::JsonResult => "json",
        }
    }

    /// Key used in the listing response.
    pub fn listing_key(&self) -> &'static str {
        match self {
            ArtifactCategory::Plot => "plots",
            ArtifactCategory::Ellipse => "elipsis",
            ArtifactCategory::Analysis => "analysis",
            ArtifactCategory::JsonResult => "json_results",
        }
    }

    /// Content type served for this category. Never sniffed from content.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactCategory::Plot | ArtifactCategory::Ellipse => "image/png",
            ArtifactCategory::Analysis => "text/plain",
            ArtifactCategory::JsonResult => "application/json",
        }
    }

    /// Resolve a retrieval route segment.
    pub fn from_url_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.url_segment() == segment)
    }

    /// Deterministic artifact filename for a video.
    pub fn filename_for(&self, video_id: &VideoId) -> String {
        format!("{}_{}", video_id, self.filename_suffix())
    }

    /// Public reference path for an artifact filename.
    pub fn link_for(&self, filename: &str) -> String {
        format!("{}/{}/{}", RESULTS_ROUTE_PREFIX, self.url_segment(), filename)
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url_segment())
    }
}

/// Filenames of the four artifacts produced for one video.
///
/// All entries are derived from the video ID, so two manifests for the same
/// ID are always equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactManifest {
    pub plot: String,
    pub elipsis: String,
    pub analysis: String,
    pub json_result: String,
}

impl ArtifactManifest {
    /// Derive the manifest for a video ID.
    pub fn for_video(video_id: &VideoId) -> Self {
        Self {
            plot: ArtifactCategory::Plot.filename_for(video_id),
            elipsis: ArtifactCategory::Ellipse.filename_for(video_id),
            analysis: ArtifactCategory::Analysis.filename_for(video_id),
            json_result: ArtifactCategory::JsonResult.filename_for(video_id),
        }
    }

    /// Filename for one category.
    pub fn filename(&self, category: ArtifactCategory) -> &str {
        match category {
            ArtifactCategory::Plot => &self.plot,
            ArtifactCategory::Ellipse => &self.elipsis,
            ArtifactCategory::Analysis => &self.analysis,
            ArtifactCategory::JsonResult => &self.json_result,
        }
    }

    /// Iterate `(category, filename)` pairs in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = (ArtifactCategory, &str)> {
        ArtifactCategory::ALL
            .into_iter()
            .map(move |c| (c, self.filename(c)))
    }

    /// Public reference path for one category.
    pub fn link(&self, category: ArtifactCategory) -> String {
        category.link_for(self.filename(category))
    }

    /// Public reference paths keyed by route segment.
    pub fn links(&self) -> BTreeMap<String, String> {
        self.entries()
            .map(|(c, name)| (c.url_segment().to_string(), c.link_for(name)))
            .collect()
    }
}
