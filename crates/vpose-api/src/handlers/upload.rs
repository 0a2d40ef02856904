//! Pair upload handler.

use std::collections::BTreeMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use vpose_models::{PairResult, UploadedVideo};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the first video.
pub const FIELD_FILE1: &str = "file1";
/// Multipart field carrying the second video.
pub const FIELD_FILE2: &str = "file2";

/// Successful pair upload response.
#[derive(Debug, Serialize)]
pub struct PairResponse {
    pub status: String,
    pub json1: String,
    pub json2: String,
    pub video1_id: String,
    pub video2_id: String,
    pub video1_results: BTreeMap<String, String>,
    pub video2_results: BTreeMap<String, String>,
}

impl From<&PairResult> for PairResponse {
    fn from(result: &PairResult) -> Self {
        Self {
            status: "success".to_string(),
            json1: result.json1_link(),
            json2: result.json2_link(),
            video1_id: result.video1_id.to_string(),
            video2_id: result.video2_id.to_string(),
            video1_results: result.manifest1.links(),
            video2_results: result.manifest2.links(),
        }
    }
}

/// Read the `file1` and `file2` fields. Other fields are ignored.
pub async fn read_video_pair(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(UploadedVideo, UploadedVideo)> {
    let mut multipart = multipart.map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;

    let mut file1 = None;
    let mut file2 = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?
    {
        let slot = match field.name() {
            Some(FIELD_FILE1) => &mut file1,
            Some(FIELD_FILE2) => &mut file2,
            _ => continue,
        };

        let content_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;

        *slot = Some(UploadedVideo::new(bytes, content_type, filename));
    }

    let file1 = file1.ok_or_else(|| ApiError::bad_request(format!("Missing field: {}", FIELD_FILE1)))?;
    let file2 = file2.ok_or_else(|| ApiError::bad_request(format!("Missing field: {}", FIELD_FILE2)))?;

    Ok((file1, file2))
}

/// Upload two videos and analyse both before responding.
pub async fn upload_videos(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PairResponse>> {
    let (video1, video2) = read_video_pair(multipart).await?;

    info!(
        file1_bytes = video1.len(),
        file2_bytes = video2.len(),
        "Received video pair"
    );

    match state.orchestrator.handle_upload_pair(video1, video2).await {
        Ok(result) => {
            metrics::record_pair_request("success");
            info!(
                video1_id = %result.video1_id,
                video2_id = %result.video2_id,
                "Video pair processed"
            );
            Ok(Json(PairResponse::from(&result)))
        }
        Err(e) => {
            metrics::record_pair_request(if e.is_client_error() { "rejected" } else { "failed" });
            Err(e.into())
        }
    }
}
