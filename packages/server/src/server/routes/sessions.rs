//! Session status endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use extraction::{ProcessingLogEntry, ResultFilter, ResultStore, SessionState, StoredExtraction};

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const DEFAULT_SESSION_LIMIT: usize = 20;
const MAX_SESSION_LIMIT: usize = 100;
const DEFAULT_SESSION_RESULTS_LIMIT: usize = 50;
const MAX_SESSION_RESULTS_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: SessionState,
    /// Still being processed by this server process.
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailedSessionResponse {
    #[serde(flatten)]
    pub session: SessionState,
    pub running: bool,
    pub logs: Vec<ProcessingLogEntry>,
    pub log_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionState>,
    pub count: usize,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionResultsResponse {
    pub session_id: Uuid,
    pub results: Vec<StoredExtraction>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SessionResultsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

async fn load(state: &AxumAppState, id: Uuid) -> Result<SessionState, ApiError> {
    state
        .deps
        .store
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

/// GET /api/sessions/:id
pub async fn get_session_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = load(&state, id).await?;
    Ok(Json(SessionResponse {
        running: state.deps.batches.is_running(id),
        session,
    }))
}

/// GET /api/sessions/:id/detailed
pub async fn get_session_detailed_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DetailedSessionResponse>, ApiError> {
    let session = load(&state, id).await?;
    let logs = state.deps.store.session_logs(id).await?;
    Ok(Json(DetailedSessionResponse {
        running: state.deps.batches.is_running(id),
        session,
        log_count: logs.len(),
        logs,
    }))
}

/// GET /api/sessions/:id/results?limit=
///
/// Results whose latest write came from this session.
pub async fn get_session_results_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SessionResultsQuery>,
) -> Result<Json<SessionResultsResponse>, ApiError> {
    load(&state, id).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SESSION_RESULTS_LIMIT)
        .clamp(1, MAX_SESSION_RESULTS_LIMIT);
    let filter = ResultFilter::new().with_session(id).with_limit(limit);
    let results = state.deps.store.list_results(&filter).await?;
    Ok(Json(SessionResultsResponse {
        session_id: id,
        count: results.len(),
        results,
    }))
}

/// GET /api/sessions?user_id=&limit=
pub async fn list_sessions_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SESSION_LIMIT)
        .clamp(1, MAX_SESSION_LIMIT);
    let sessions = state
        .deps
        .store
        .list_sessions(query.user_id.as_deref(), limit)
        .await?;
    Ok(Json(SessionListResponse {
        count: sessions.len(),
        sessions,
        limit,
    }))
}

/// POST /api/sessions/:id/cancel
pub async fn cancel_session_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if state.deps.batches.cancel(id) {
        return Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "session_id": id, "status": "cancelling" })),
        ));
    }

    let session = load(&state, id).await?;
    if session.status.is_terminal() {
        Err(ApiError::Conflict(format!("Session is already {}", session.status)))
    } else {
        Err(ApiError::Conflict(
            "Session is not running on this server".to_string(),
        ))
    }
}
