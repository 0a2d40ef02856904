//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use vpose_models::ArtifactCategory;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vpose_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vpose_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vpose_http_requests_in_flight";

    // Pair metrics
    pub const PAIR_REQUESTS_TOTAL: &str = "vpose_pair_requests_total";
    pub const JOBS_SUBMITTED_TOTAL: &str = "vpose_jobs_submitted_total";

    // Retrieval metrics
    pub const ARTIFACTS_SERVED_TOTAL: &str = "vpose_artifacts_served_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vpose_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a synchronous pair request and its outcome.
pub fn record_pair_request(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::PAIR_REQUESTS_TOTAL, &labels).increment(1);
}

/// Record a pair job submission.
pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

/// Record an artifact served.
pub fn record_artifact_served(category: ArtifactCategory) {
    let labels = [("category", category.url_segment().to_string())];
    counter!(names::ARTIFACTS_SERVED_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (replace filenames and IDs).
fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["", "results", category, _] => format!("/results/{}/:filename", category),
        ["", "jobs", _] => "/jobs/:job_id".to_string(),
        _ => path.to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/results/plot/550e8400-e29b-41d4-a716-446655440000_plot.png"),
            "/results/plot/:filename"
        );
        assert_eq!(
            sanitize_path("/jobs/550e8400-e29b-41d4-a716-446655440000"),
            "/jobs/:job_id"
        );
        assert_eq!(sanitize_path("/list-results"), "/list-results");
        assert_eq!(sanitize_path("/"), "/");
    }
}
