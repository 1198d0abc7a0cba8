//! Store totals and collaborator availability.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{extract::Extension, Json};
use serde::Serialize;

use extraction::{Fetcher, LanguageModel, ResultStore};

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_results: usize,
    pub total_sessions: usize,
    pub results_by_kind: BTreeMap<String, usize>,
    pub running_batches: usize,
    pub collaborators: Collaborators,
}

#[derive(Debug, Serialize)]
pub struct Collaborators {
    pub store: Collaborator,
    pub fetcher: Collaborator,
    pub model: Collaborator,
}

#[derive(Debug, Serialize)]
pub struct Collaborator {
    pub name: String,
    pub available: bool,
}

/// GET /api/stats
///
/// The store is pinged; the fetcher and model count as available once
/// configured, since checking them would spend quota.
pub async fn stats_handler(
    Extension(state): Extension<AxumAppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let deps = &state.deps;
    let stats = deps.store.stats().await?;
    let store_available = matches!(
        tokio::time::timeout(PING_TIMEOUT, deps.store.ping()).await,
        Ok(Ok(()))
    );

    Ok(Json(StatsResponse {
        total_results: stats.total_results,
        total_sessions: stats.total_sessions,
        results_by_kind: stats.results_by_kind,
        running_batches: deps.batches.running_count(),
        collaborators: Collaborators {
            store: Collaborator {
                name: deps.store.name().to_string(),
                available: store_available,
            },
            fetcher: Collaborator {
                name: deps.fetcher.name().to_string(),
                available: true,
            },
            model: Collaborator {
                name: deps.model.name().to_string(),
                available: true,
            },
        },
    }))
}
