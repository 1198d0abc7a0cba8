//! Batch submission and single-URL dry-run endpoints.

use std::collections::HashSet;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use extraction::urls::validate_for_kind;
use extraction::{ExtractionKind, SessionStatus, UrlPreview};

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

/// Rough wall-clock cost of one URL, used for the submission estimate.
const MINUTES_PER_URL: f64 = 0.75;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeAccepted {
    pub session_id: Uuid,
    pub kind: ExtractionKind,
    pub status: SessionStatus,
    pub total_urls: usize,
    pub estimated_duration_minutes: f64,
    pub status_endpoint: String,
    pub message: String,
}

/// Trimmed, non-empty URLs in first-seen order with duplicates dropped.
fn unique_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}

/// POST /api/jobs/scrape
pub async fn scrape_jobs_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<(StatusCode, Json<ScrapeAccepted>), ApiError> {
    submit(&state, ExtractionKind::JobPosting, request).await
}

/// POST /api/forms/scrape
pub async fn scrape_forms_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<(StatusCode, Json<ScrapeAccepted>), ApiError> {
    submit(&state, ExtractionKind::GoogleForm, request).await
}

/// POST /api/jobs/test
pub async fn test_job_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<TestRequest>,
) -> Result<Json<UrlPreview>, ApiError> {
    preview(&state, ExtractionKind::JobPosting, request).await
}

/// POST /api/forms/test
pub async fn test_form_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<TestRequest>,
) -> Result<Json<UrlPreview>, ApiError> {
    preview(&state, ExtractionKind::GoogleForm, request).await
}

/// Run one URL through the pipeline without creating a session or storing
/// the result.
async fn preview(
    state: &AxumAppState,
    kind: ExtractionKind,
    request: TestRequest,
) -> Result<Json<UrlPreview>, ApiError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("No URL provided"));
    }
    validate_for_kind(url, kind).map_err(|e| {
        ApiError::bad_request_with("Invalid URL", json!({ "url": url, "error": e.to_string() }))
    })?;

    Ok(Json(state.deps.runner(kind).preview(url).await))
}

async fn submit(
    state: &AxumAppState,
    kind: ExtractionKind,
    request: ScrapeRequest,
) -> Result<(StatusCode, Json<ScrapeAccepted>), ApiError> {
    let urls = unique_urls(request.urls);
    if urls.is_empty() {
        return Err(ApiError::bad_request("No URLs provided"));
    }

    let max = state.deps.settings.max_urls_per_batch;
    if urls.len() > max {
        return Err(ApiError::bad_request_with(
            format!("Maximum {} URLs allowed per batch", max),
            json!({ "max_urls": max, "received": urls.len() }),
        ));
    }

    let invalid: Vec<_> = urls
        .iter()
        .filter_map(|url| {
            validate_for_kind(url, kind)
                .err()
                .map(|e| json!({ "url": url, "error": e.to_string() }))
        })
        .collect();
    if !invalid.is_empty() {
        return Err(ApiError::bad_request_with("Invalid URLs", json!(invalid)));
    }

    let runner = state.deps.runner(kind).clone();
    let session = state
        .deps
        .batches
        .start(runner, urls, request.user_id)
        .await?;

    tracing::info!(
        session_id = %session.id,
        kind = %kind,
        total_urls = session.total_urls,
        "Accepted scrape batch"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ScrapeAccepted {
            session_id: session.id,
            kind,
            status: session.status,
            total_urls: session.total_urls,
            estimated_duration_minutes: session.total_urls as f64 * MINUTES_PER_URL,
            status_endpoint: format!("/api/sessions/{}", session.id),
            message: format!("Started extraction of {} URLs", session.total_urls),
        }),
    ))
}
