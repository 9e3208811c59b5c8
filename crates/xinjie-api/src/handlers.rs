//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body input, delegates to the services
//! in AppState and returns JSON (or raw SVG for the export route).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use xinjie_core::types::{ResponseRecord, ShareLinks, Submission};

use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

/// Exported SVGs never change once stored.
const SVG_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateResponseRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseListBody {
    pub responses: Vec<ResponseRecord>,
    pub current_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub uptime_secs: u64,
    pub total_responses: u64,
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid response id '{}'", raw)))
}

fn parse_page(raw: Option<&str>) -> Result<u64, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Parameter 'page' must be a positive integer, got '{}'",
                    s
                ))
            }),
    }
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /responses - interpret a prompt and store the result.
pub async fn create_response(
    State(state): State<AppState>,
    payload: Result<Json<CreateResponseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let prompt = payload.prompt.unwrap_or_default();

    let submission = state.ingest.submit(&prompt).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// GET /responses?page=N - one page of history, newest first.
pub async fn list_responses(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ResponseListBody>, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let page = state.history.list_page(page).await?;

    Ok(Json(ResponseListBody {
        responses: page.records,
        current_page: page.current_page,
        total_pages: page.total_pages,
    }))
}

/// GET /responses/{id} - a single record.
pub async fn get_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponseRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.history.get_by_id(id).await?))
}

/// GET /responses/{id}/svg - the stored image as a cacheable SVG document.
pub async fn get_response_svg(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let svg = state.history.svg(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, SVG_CACHE_CONTROL),
        ],
        svg,
    )
        .into_response())
}

/// GET /responses/{id}/share - permalink and social share links.
pub async fn share_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareLinks>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.history.share(id, &state.public_base_url).await?))
}

/// GET /health - liveness plus a row count from the active backend.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let total_responses = state.history.total_count().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_responses,
    }))
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not_found".to_string(),
            message: "Route not found".to_string(),
        }),
    )
        .into_response()
}
