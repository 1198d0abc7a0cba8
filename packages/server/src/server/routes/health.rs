use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use extraction::ResultStore;

use crate::server::app::AxumAppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: StoreHealth,
    running_batches: usize,
}

#[derive(Serialize)]
pub struct StoreHealth {
    name: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Returns 200 OK when the result store answers within five seconds,
/// 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AxumAppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let store = &state.deps.store;
    let (status, error) = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        store.ping(),
    )
    .await
    {
        Ok(Ok(())) => ("ok", None),
        Ok(Err(e)) => ("error", Some(format!("Ping failed: {}", e))),
        Err(_) => ("error", Some("Ping timeout (>5s)".to_string())),
    };

    let is_healthy = error.is_none();
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            store: StoreHealth {
                name: store.name().to_string(),
                status: status.to_string(),
                error,
            },
            running_batches: state.deps.batches.running_count(),
        }),
    )
}
