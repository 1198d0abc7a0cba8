//! Stored extraction endpoints.

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use extraction::{ExtractionKind, ResultFilter, ResultStore, StoredExtraction};

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 100;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ResultListQuery {
    pub kind: Option<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ResultSearchQuery {
    pub q: Option<String>,
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ResultListResponse {
    pub results: Vec<StoredExtraction>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct ResultSearchResponse {
    pub results: Vec<StoredExtraction>,
    pub count: usize,
    pub query: String,
}

fn parse_kind(raw: Option<&str>) -> Result<Option<ExtractionKind>, ApiError> {
    raw.filter(|k| !k.is_empty())
        .map(|k| k.parse().map_err(ApiError::bad_request))
        .transpose()
}

/// GET /api/results?kind=&min_confidence=&limit=&offset=
pub async fn list_results_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<ResultListQuery>,
) -> Result<Json<ResultListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let mut filter = ResultFilter::new().with_limit(limit).with_offset(offset);
    if let Some(kind) = parse_kind(query.kind.as_deref())? {
        filter = filter.with_kind(kind);
    }
    if let Some(min) = query.min_confidence {
        filter = filter.with_min_confidence(min);
    }

    let results = state.deps.store.list_results(&filter).await?;
    Ok(Json(ResultListResponse {
        count: results.len(),
        results,
        limit,
        offset,
    }))
}

/// GET /api/results/search?q=&kind=&limit=
pub async fn search_results_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<ResultSearchQuery>,
) -> Result<Json<ResultSearchResponse>, ApiError> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(ApiError::bad_request("Query parameter required"));
    }

    let limit = query
        .limit
        .unwrap_or(MAX_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let mut filter = ResultFilter::new().with_limit(limit);
    if let Some(kind) = parse_kind(query.kind.as_deref())? {
        filter = filter.with_kind(kind);
    }

    let results = state.deps.store.search_results(q, &filter).await?;
    Ok(Json(ResultSearchResponse {
        count: results.len(),
        results,
        query: q.to_string(),
    }))
}

/// GET /api/results/:id
pub async fn get_result_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredExtraction>, ApiError> {
    state
        .deps
        .store
        .get_result(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))
}
