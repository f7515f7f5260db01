//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use melodora_core::{ComparisonResult, ComparisonSummary};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of `POST /music/compare`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub user_uid: String,
    /// Older clients send `youtube_url`
    #[serde(default, alias = "youtube_url")]
    pub source_url: String,
}

/// POST /music/compare
pub async fn compare(
    State(state): State<AppState>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> ApiResult<Json<ComparisonResult>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    log::info!("POST /music/compare user={} url={}", request.user_uid, request.source_url);

    let result = state
        .comparator
        .compare(&request.user_uid, &request.source_url)
        .await?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /music/history/:user_uid
pub async fn history(
    State(state): State<AppState>,
    Path(user_uid): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ComparisonSummary>>> {
    let limit = query.limit.unwrap_or(state.history_limit);
    log::debug!("GET /music/history/{} limit={}", user_uid, limit);
    let rows = state.comparator.history(&user_uid, Some(limit)).await?;
    Ok(Json(rows))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "melodora".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
