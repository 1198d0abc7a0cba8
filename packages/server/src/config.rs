use anyhow::{Context, Result};
use dotenvy::dotenv;
use extraction::{
    BatchConfig, ClassifierConfig, ExtractionConfig, ExtractionKind, PipelineConfig, ScoringConfig,
};
use serde::Serialize;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// In-memory store when unset.
    pub database_url: Option<String>,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub firecrawl_api_key: String,
    pub allowed_origins: Vec<String>,
    pub pipeline: PipelineSettings,
}

/// Tunables shared by the job and form pipelines.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSettings {
    pub batch_concurrency: usize,
    pub max_urls_per_batch: usize,
    pub fetch_requests_per_second: Option<u32>,
    pub ai_weight: f64,
    pub validation_weight: f64,
    pub completeness_bonus: f64,
    pub min_content_length: usize,
    pub min_indicators: usize,
    pub allow_poor_extraction: bool,
    pub model: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let scoring = ScoringConfig::default();
        let batch = BatchConfig::default();
        let classifier = ClassifierConfig::default();
        Self {
            batch_concurrency: batch.concurrency,
            max_urls_per_batch: batch.max_urls,
            fetch_requests_per_second: None,
            ai_weight: scoring.ai_weight,
            validation_weight: scoring.validation_weight,
            completeness_bonus: scoring.completeness_bonus,
            min_content_length: classifier.min_length,
            min_indicators: classifier.min_indicators,
            allow_poor_extraction: false,
            model: ExtractionConfig::default().model,
        }
    }
}

impl PipelineSettings {
    /// Library configuration for one extraction kind.
    pub fn pipeline_config(&self, kind: ExtractionKind) -> PipelineConfig {
        PipelineConfig {
            classifier: ClassifierConfig::for_kind(kind)
                .with_min_length(self.min_content_length)
                .with_min_indicators(self.min_indicators),
            scoring: ScoringConfig::new()
                .with_weights(self.ai_weight, self.validation_weight)
                .with_bonus(self.completeness_bonus),
            extraction: ExtractionConfig::new()
                .with_model(self.model.clone())
                .with_allow_poor(self.allow_poor_extraction),
            batch: BatchConfig::default()
                .with_concurrency(self.batch_concurrency)
                .with_max_urls(self.max_urls_per_batch),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        _ => Ok(default),
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = PipelineSettings::default();
        let openai_model = optional_env("OPENAI_MODEL").unwrap_or_else(|| defaults.model.clone());

        let fetch_requests_per_second = match optional_env("FETCH_REQUESTS_PER_SECOND") {
            Some(raw) => Some(
                raw.trim()
                    .parse()
                    .context("FETCH_REQUESTS_PER_SECOND must be a positive integer")?,
            ),
            None => None,
        };

        let pipeline = PipelineSettings {
            batch_concurrency: parse_env("BATCH_CONCURRENCY", defaults.batch_concurrency)?,
            max_urls_per_batch: parse_env("MAX_URLS_PER_BATCH", defaults.max_urls_per_batch)?,
            fetch_requests_per_second,
            ai_weight: parse_env("AI_WEIGHT", defaults.ai_weight)?,
            validation_weight: parse_env("VALIDATION_WEIGHT", defaults.validation_weight)?,
            completeness_bonus: parse_env("COMPLETENESS_BONUS", defaults.completeness_bonus)?,
            min_content_length: parse_env("MIN_CONTENT_LENGTH", defaults.min_content_length)?,
            min_indicators: parse_env("MIN_INDICATORS", defaults.min_indicators)?,
            allow_poor_extraction: parse_env("ALLOW_POOR_EXTRACTION", defaults.allow_poor_extraction)?,
            model: openai_model.clone(),
        };

        Ok(Self {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model,
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY")
                .context("FIRECRAWL_API_KEY must be set")?,
            allowed_origins: optional_env("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            pipeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_library_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.ai_weight, 0.4);
        assert_eq!(settings.validation_weight, 0.6);
        assert_eq!(settings.max_urls_per_batch, 50);
        assert_eq!(settings.min_content_length, 500);
        assert!(!settings.allow_poor_extraction);
    }

    #[test]
    fn test_pipeline_config_carries_overrides() {
        let settings = PipelineSettings {
            min_content_length: 200,
            allow_poor_extraction: true,
            batch_concurrency: 8,
            ..PipelineSettings::default()
        };
        let config = settings.pipeline_config(ExtractionKind::GoogleForm);
        assert_eq!(config.classifier.min_length, 200);
        assert!(config.extraction.allow_poor);
        assert_eq!(config.batch.concurrency, 8);
        assert_eq!(
            config.classifier.indicators,
            ClassifierConfig::for_forms().indicators
        );
    }
}
