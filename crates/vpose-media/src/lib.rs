//! Adapter around the external pose-analysis routine.
//!
//! This crate provides:
//! - The `VideoProcessor` contract: one input video, four output paths
//! - A command-line implementation that runs the analysis as a child process
//! - Timeout handling and stderr capture for failed runs
//! - Verification that every output was produced

pub mod command;
pub mod error;
pub mod processor;

pub use command::{check_processor, CommandProcessor, PoseCommand, ProcessorConfig};
pub use error::{MediaError, MediaResult};
pub use processor::{ProcessorOutputs, VideoProcessor};
