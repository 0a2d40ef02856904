//! Asynchronous pair job handlers.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use vpose_models::{JobId, JobRecord};

use crate::error::ApiResult;
use crate::handlers::upload::read_video_pair;
use crate::metrics;
use crate::state::AppState;

/// Response for an accepted job.
#[derive(Debug, Serialize)]
pub struct JobSubmittedResponse {
    pub status: String,
    pub job_id: String,
    pub video1_id: String,
    pub video2_id: String,
}

/// Store a pair and analyse it in the background.
pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<JobSubmittedResponse>)> {
    let (video1, video2) = read_video_pair(multipart).await?;

    let record = state.jobs.submit(video1, video2).await?;
    metrics::record_job_submitted();

    Ok((
        StatusCode::ACCEPTED,
        Json(JobSubmittedResponse {
            status: record.status.to_string(),
            job_id: record.job_id.to_string(),
            video1_id: record.video1_id.to_string(),
            video2_id: record.video2_id.to_string(),
        }),
    ))
}

/// Current state of a job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    let record = state.jobs.status(&JobId::from_string(job_id)).await?;
    Ok(Json(record))
}
