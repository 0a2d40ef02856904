//! Shared data models for the paired video pose-analysis backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video identifiers and uploaded videos
//! - Artifact categories and per-video manifests
//! - Pair results returned to clients
//! - Asynchronous pair jobs

pub mod artifact;
pub mod job;
pub mod pair;
pub mod video;

// Re-export common types
pub use artifact::{ArtifactCategory, ArtifactManifest};
pub use job::{JobId, JobRecord, JobStatus};
pub use pair::PairResult;
pub use video::{UploadedVideo, VideoId};
