//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use vpose_media::check_processor;

use crate::state::AppState;

/// Root liveness response.
#[derive(Serialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
}

/// Root endpoint, kept for existing clients.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "Video processing API is running".to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub storage: CheckStatus,
    pub processor: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks the storage directories and the analysis program.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let unwritable = state.store.unwritable_dirs().await;
    let storage_check = if unwritable.is_empty() {
        CheckStatus::ok()
    } else {
        let dirs: Vec<String> = unwritable.iter().map(|d| d.display().to_string()).collect();
        CheckStatus::error(format!("not writable: {}", dirs.join(", ")))
    };

    let processor_check = match state.processor_program.as_deref() {
        Some(program) => match check_processor(program) {
            Ok(_) => CheckStatus::ok(),
            Err(e) => CheckStatus::error(e.to_string()),
        },
        None => CheckStatus::ok(),
    };

    let all_ok = storage_check.is_ok() && processor_check.is_ok();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            storage: storage_check,
            processor: processor_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
