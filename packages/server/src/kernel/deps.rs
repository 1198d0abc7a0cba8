//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by the HTTP
//! routes and the CLI. Every external service sits behind a trait from the
//! extraction library, so tests swap in mocks.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use extraction::{
    BatchRunner, ExtractionKind, Fetcher, FetcherExt, FirecrawlFetcher, LanguageModel,
    MemoryStore, ModelCredentials, OpenAiModel, PostgresStore, ResultStore,
};

use crate::config::{Config, PipelineSettings};
use crate::kernel::batches::BatchRegistry;

/// Dependencies shared by every request.
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn ResultStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub model: Arc<dyn LanguageModel>,
    pub jobs: Arc<BatchRunner>,
    pub forms: Arc<BatchRunner>,
    pub batches: BatchRegistry,
    pub settings: PipelineSettings,
}

impl ServerDeps {
    /// Wire runners for both extraction kinds over the given collaborators.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn ResultStore>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        let runner = |kind: ExtractionKind| -> Result<Arc<BatchRunner>> {
            let runner = BatchRunner::new(
                fetcher.clone(),
                model.clone(),
                store.clone(),
                &settings.pipeline_config(kind),
                kind.schema(),
            )
            .with_context(|| format!("Invalid {} pipeline configuration", kind))?;
            Ok(Arc::new(runner))
        };

        Ok(Self {
            jobs: runner(ExtractionKind::JobPosting)?,
            forms: runner(ExtractionKind::GoogleForm)?,
            store,
            fetcher,
            model,
            batches: BatchRegistry::new(),
            settings,
        })
    }

    /// Runner for an extraction kind.
    pub fn runner(&self, kind: ExtractionKind) -> &Arc<BatchRunner> {
        match kind {
            ExtractionKind::JobPosting => &self.jobs,
            ExtractionKind::GoogleForm => &self.forms,
        }
    }
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise in-memory.
pub async fn create_store(config: &Config) -> Result<Arc<dyn ResultStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PostgresStore::from_pool(pool)
                .await
                .context("Failed to prepare database tables")?;
            tracing::info!("Database connected");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, results are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Firecrawl, optionally behind a rate limiter.
pub fn create_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>> {
    let firecrawl = FirecrawlFetcher::new(config.firecrawl_api_key.clone())
        .context("Failed to create Firecrawl fetcher")?;

    match config.pipeline.fetch_requests_per_second {
        Some(rps) => {
            tracing::info!(requests_per_second = rps, "Rate limiting page fetches");
            let limited = firecrawl
                .rate_limited(rps)
                .context("Invalid FETCH_REQUESTS_PER_SECOND")?;
            Ok(Arc::new(limited))
        }
        None => Ok(Arc::new(firecrawl)),
    }
}

/// OpenAI chat completions.
pub fn create_model(config: &Config) -> Arc<dyn LanguageModel> {
    let mut credentials = ModelCredentials::new(config.openai_api_key.clone(), config.openai_model.clone());
    if let Some(base_url) = &config.openai_base_url {
        credentials = credentials.with_base_url(base_url.clone());
    }
    tracing::info!(credentials = ?credentials, "Using OpenAI chat completions");
    Arc::new(OpenAiModel::new(&credentials))
}

/// Build every production dependency from configuration.
pub async fn create_server_deps(config: &Config) -> Result<ServerDeps> {
    let store = create_store(config).await?;
    let fetcher = create_fetcher(config)?;
    let model = create_model(config);
    ServerDeps::new(fetcher, model, store, config.pipeline.clone())
}
