//! Artifact store operations.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use vpose_models::{ArtifactCategory, UploadedVideo, VideoId};

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Check that a client-supplied filename is a single plain path component.
pub fn validate_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
    {
        return Err(StorageError::invalid_key(filename));
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::invalid_key(filename)),
    }
}

/// Flat-file store for raw uploads and derived artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    config: StorageConfig,
}

impl ArtifactStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Create every directory of the layout. Idempotent.
    pub async fn ensure_layout(&self) -> StorageResult<()> {
        for dir in self.config.all_dirs() {
            fs::create_dir_all(dir).await?;
        }
        debug!("Storage layout ready under {}", self.config.upload_dir.display());
        Ok(())
    }

    /// Deterministic on-disk path of one artifact of a video.
    pub fn artifact_path(&self, category: ArtifactCategory, video_id: &VideoId) -> PathBuf {
        self.config
            .category_dir(category)
            .join(category.filename_for(video_id))
    }

    /// Path a raw upload is stored under.
    pub fn upload_path(&self, video_id: &VideoId, upload: &UploadedVideo) -> PathBuf {
        self.config
            .upload_dir
            .join(format!("{}_{}", video_id, upload.sanitized_filename()))
    }

    /// Write a raw upload to the uploads directory.
    ///
    /// Never overwrites an existing file.
    pub async fn persist_upload(
        &self,
        video_id: &VideoId,
        upload: &UploadedVideo,
    ) -> StorageResult<PathBuf> {
        let path = self.upload_path(video_id, upload);
        fs::create_dir_all(&self.config.upload_dir).await?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        let written = async {
            file.write_all(&upload.bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!("Failed to remove partial upload {}: {}", path.display(), cleanup);
            }
            return Err(StorageError::upload_failed(format!("{}: {}", path.display(), e)));
        }

        info!(
            video_id = %video_id,
            bytes = upload.len(),
            "Stored upload {}",
            path.display()
        );
        Ok(path)
    }

    /// Resolve a client-supplied filename inside a category directory.
    pub fn resolve(&self, category: ArtifactCategory, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;

        let root = self.config.category_dir(category);
        let path = root.join(filename);

        if path.parent() != Some(root) {
            return Err(StorageError::invalid_key(filename));
        }
        Ok(path)
    }

    /// Read an artifact. Missing files and non-regular files are `NotFound`.
    pub async fn read_artifact(
        &self,
        category: ArtifactCategory,
        filename: &str,
    ) -> StorageResult<Vec<u8>> {
        let path = self.resolve(category, filename)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StorageError::not_found(filename)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::not_found(filename))
            }
            Err(e) => return Err(StorageError::Io(e)),
        }

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::not_found(filename),
            _ => StorageError::Io(e),
        })?;

        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    /// Whether an artifact file exists.
    pub async fn artifact_exists(&self, category: ArtifactCategory, filename: &str) -> bool {
        match self.resolve(category, filename) {
            Ok(path) => fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Filenames in one category directory, sorted.
    ///
    /// A missing directory lists as empty.
    pub async fn list_category(&self, category: ArtifactCategory) -> StorageResult<Vec<String>> {
        let dir = self.config.category_dir(category);

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::list_failed(format!("{}: {}", dir.display(), e)))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::list_failed(format!("{}: {}", dir.display(), e)))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Filenames of every category.
    pub async fn list_all(&self) -> StorageResult<BTreeMap<ArtifactCategory, Vec<String>>> {
        let mut listing = BTreeMap::new();
        for category in ArtifactCategory::ALL {
            listing.insert(category, self.list_category(category).await?);
        }
        Ok(listing)
    }

    /// Directories that are missing or not writable.
    pub async fn unwritable_dirs(&self) -> Vec<PathBuf> {
        let mut bad = Vec::new();
        for dir in self.config.all_dirs() {
            let ok = fs::metadata(dir)
                .await
                .map(|m| m.is_dir() && !m.permissions().readonly())
                .unwrap_or(false);
            if !ok {
                bad.push(dir.to_path_buf());
            }
        }
        bad
    }
}
