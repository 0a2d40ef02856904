//! Flat-file artifact store.
//!
//! This crate provides:
//! - Storage layout configuration (uploads plus one directory per artifact category)
//! - Deterministic artifact paths derived from video IDs
//! - Raw upload persistence
//! - Sanitized artifact lookup and listing

pub mod config;
pub mod error;
pub mod store;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use store::{validate_filename, ArtifactStore};
