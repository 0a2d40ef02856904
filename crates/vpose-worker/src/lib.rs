//! Per-video pipeline and pair orchestration.
//!
//! This crate provides:
//! - The per-video pipeline (deterministic output paths, analysis invocation)
//! - The pair orchestrator (validation, raw persistence, atomic pair result)
//! - Asynchronous pair jobs with a pollable status registry
//! - Structured per-video logging

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use jobs::{JobRegistry, PairJobService};
pub use logging::PipelineLogger;
pub use orchestrator::{AcceptedPair, PairOrchestrator};
pub use pipeline::VideoPipeline;

#[cfg(test)]
pub(crate) mod test_support;
