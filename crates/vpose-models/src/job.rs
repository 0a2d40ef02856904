//! Asynchronous pair job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{PairResult, VideoId};

/// Unique identifier for a pair job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a pair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Videos persisted, waiting to run
    #[default]
    Submitted,
    /// Analysis in progress
    Running,
    /// Both videos analysed
    Done,
    /// At least one video failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a pair job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    pub video1_id: VideoId,
    pub video2_id: VideoId,

    /// Present once the job is done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PairResult>,

    /// Present once the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub submitted_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a freshly submitted job.
    pub fn submitted(job_id: JobId, video1_id: VideoId, video2_id: VideoId) -> Self {
        Self {
            job_id,
            status: JobStatus::Submitted,
            video1_id,
            video2_id,
            result: None,
            error_message: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Mark as running.
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark as done.
    pub fn complete(&mut self, result: PairResult) {
        self.status = JobStatus::Done;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
    }

    /// Mark as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArtifactManifest;

    #[test]
    fn test_job_lifecycle() {
        let v1 = VideoId::new();
        let v2 = VideoId::new();
        let mut job = JobRecord::submitted(JobId::new(), v1.clone(), v2.clone());
        assert_eq!(job.status, JobStatus::Submitted);
        assert!(!job.status.is_terminal());

        job.start();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.started_at.is_some());

        let result = PairResult::new(
            v1.clone(),
            ArtifactManifest::for_video(&v1),
            v2.clone(),
            ArtifactManifest::for_video(&v2),
        );
        job.complete(result);
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.status.is_terminal());
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_job_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");

        let mut job = JobRecord::submitted(JobId::new(), VideoId::new(), VideoId::new());
        job.fail("processor exited with status 1");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error_message"], "processor exited with status 1");
        assert!(value.get("result").is_none());
    }
}
