//! Artifact retrieval and listing handlers.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use vpose_models::ArtifactCategory;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Serve one artifact with its category's content type.
pub async fn get_result(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    let category = ArtifactCategory::from_url_segment(&category)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid category: {}", category)))?;

    let data = state.store.read_artifact(category, &filename).await?;

    debug!(category = category.url_segment(), "Serving {}", filename);
    metrics::record_artifact_served(category);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, category.content_type())
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "\\\"")),
        )
        .body(Body::from(data))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Listing of every stored artifact.
#[derive(Debug, Serialize)]
pub struct ListResultsResponse {
    pub status: String,
    pub data: BTreeMap<&'static str, Vec<String>>,
}

/// List the filenames of every category.
pub async fn list_results(State(state): State<AppState>) -> ApiResult<Json<ListResultsResponse>> {
    let listing = state.store.list_all().await?;

    let data = listing
        .into_iter()
        .map(|(category, files)| (category.listing_key(), files))
        .collect();

    Ok(Json(ListResultsResponse {
        status: "success".to_string(),
        data,
    }))
}
