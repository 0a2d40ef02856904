//! Worker configuration.

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum analyses running at once across all requests
    pub max_concurrent_analyses: usize,
    /// Run both videos of a pair at the same time instead of one after another
    pub pair_concurrent: bool,
    /// Maximum job records kept in memory
    pub max_retained_jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_analyses: 2,
            pair_concurrent: false,
            max_retained_jobs: 1000,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_analyses: std::env::var("WORKER_MAX_CONCURRENT_ANALYSES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(2),
            pair_concurrent: std::env::var("WORKER_PAIR_CONCURRENT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            max_retained_jobs: std::env::var("WORKER_MAX_RETAINED_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1000),
        }
    }
}
