//! Storage layout configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vpose_models::ArtifactCategory;

/// Directory roots for raw uploads and the four artifact categories.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Raw uploaded videos
    pub upload_dir: PathBuf,
    /// Movement plots
    pub plots_dir: PathBuf,
    /// Ellipse overlays
    pub elipsis_dir: PathBuf,
    /// Analysis texts
    pub analysis_dir: PathBuf,
    /// Structured JSON results
    pub json_results_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::under_root(".")
    }
}

impl StorageConfig {
    /// Default layout below a single root directory.
    pub fn under_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            upload_dir: root.join("uploads"),
            plots_dir: root.join("plots"),
            elipsis_dir: root.join("elipsis"),
            analysis_dir: root.join("analysis"),
            json_results_dir: root.join("json_results"),
        }
    }

    /// Create config from environment variables.
    ///
    /// Relative directory names are resolved against `STORAGE_ROOT`.
    pub fn from_env() -> Self {
        let root = PathBuf::from(std::env::var("STORAGE_ROOT").unwrap_or_else(|_| ".".to_string()));
        let dir = |var: &str, default: &str| {
            root.join(std::env::var(var).unwrap_or_else(|_| default.to_string()))
        };

        Self {
            upload_dir: dir("UPLOAD_DIR", "uploads"),
            plots_dir: dir("PLOTS_DIR", "plots"),
            elipsis_dir: dir("ELIPSIS_DIR", "elipsis"),
            analysis_dir: dir("ANALYSIS_DIR", "analysis"),
            json_results_dir: dir("JSON_RESULTS_DIR", "json_results"),
        }
    }

    /// Root directory of one artifact category.
    pub fn category_dir(&self, category: ArtifactCategory) -> &Path {
        match category {
            ArtifactCategory::Plot => &self.plots_dir,
            ArtifactCategory::Ellipse => &self.elipsis_dir,
            ArtifactCategory::Analysis => &self.analysis_dir,
            ArtifactCategory::JsonResult => &self.json_results_dir,
        }
    }

    /// Every directory of the layout, uploads first.
    pub fn all_dirs(&self) -> [&Path; 5] {
        [
            &self.upload_dir,
            &self.plots_dir,
            &self.elipsis_dir,
            &self.analysis_dir,
            &self.json_results_dir,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_root_layout() {
        let config = StorageConfig::under_root("/data");
        assert_eq!(config.upload_dir, PathBuf::from("/data/uploads"));
        assert_eq!(
            config.category_dir(ArtifactCategory::Ellipse),
            Path::new("/data/elipsis")
        );
        assert_eq!(
            config.category_dir(ArtifactCategory::JsonResult),
            Path::new("/data/json_results")
        );
        assert_eq!(config.all_dirs().len(), 5);
    }
}
