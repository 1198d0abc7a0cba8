use axum::{extract::Extension, Json};
use serde::Serialize;

use extraction::{
    BatchConfig, ClassifierConfig, ExtractionConfig, ExtractionKind, ResultStore, ScoringConfig,
};

use crate::server::app::AxumAppState;

#[derive(Serialize)]
pub struct KindConfig {
    pub kind: ExtractionKind,
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub extraction: ExtractionConfig,
    pub batch: BatchConfig,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub store: String,
    pub running_batches: usize,
    pub pipelines: Vec<KindConfig>,
}

/// Effective pipeline configuration for each extraction kind.
pub async fn config_handler(Extension(state): Extension<AxumAppState>) -> Json<ConfigResponse> {
    let pipelines = [ExtractionKind::JobPosting, ExtractionKind::GoogleForm]
        .into_iter()
        .map(|kind| {
            let config = state.deps.settings.pipeline_config(kind);
            KindConfig {
                kind,
                classifier: config.classifier,
                scoring: config.scoring,
                extraction: config.extraction,
                batch: config.batch,
            }
        })
        .collect();

    Json(ConfigResponse {
        store: state.deps.store.name().to_string(),
        running_batches: state.deps.batches.running_count(),
        pipelines,
    })
}
