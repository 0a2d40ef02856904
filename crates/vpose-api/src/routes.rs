//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use vpose_models::artifact::RESULTS_ROUTE_PREFIX;

use crate::handlers::{
    get_job, get_result, health, list_results, ready, root, submit_job, upload_videos,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, redact_internal_errors, request_id, request_logging,
    security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    // Uploads start analyses, so they are rate-limited per client IP
    let upload_routes = Router::new()
        .route("/upload_videos", post(upload_videos))
        .route("/jobs", post(submit_job))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let result_routes = Router::new()
        .route(
            &format!("{}/:category/:filename", RESULTS_ROUTE_PREFIX),
            get(get_result),
        )
        .route("/list-results", get(list_results))
        .route("/jobs/:job_id", get(get_job));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(upload_routes)
        .merge(result_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // The configured limit replaces the multipart extractor's default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.config.is_production(),
            redact_internal_errors,
        ))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
