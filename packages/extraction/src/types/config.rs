//! Configuration types for classification, extraction, scoring, and batches.
//!
//! Every component takes its config at construction. Nothing reads
//! process-wide state, so several profiles can run side by side.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::types::record::ExtractionKind;

/// Configuration for the quality classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum trimmed character count below which content is `invalid`.
    ///
    /// Default: 500.
    pub min_length: usize,

    /// Minimum number of indicator patterns that must match for `good`.
    ///
    /// Default: 2.
    pub min_indicators: usize,

    /// Case-insensitive regular expressions signalling domain content.
    pub indicators: Vec<String>,

    /// Case-insensitive regular expressions that mark a missing page when
    /// they match the body.
    pub not_found_markers: Vec<String>,

    /// Case-insensitive regular expressions that mark a missing page when
    /// they match the title.
    #[serde(default)]
    pub title_markers: Vec<String>,

    /// Fetch status codes that mean "not found or removed".
    ///
    /// Default: 404, 410.
    pub not_found_status_codes: Vec<u16>,

    /// Weight of the normalized length in the score.
    pub length_weight: f64,

    /// Weight of the indicator ratio in the score.
    pub indicator_weight: f64,

    /// Character count at which the length component saturates.
    ///
    /// Default: 1000.
    pub length_saturation: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::for_jobs()
    }
}

impl ClassifierConfig {
    /// Indicators and markers for job postings.
    pub fn for_jobs() -> Self {
        Self {
            min_length: 500,
            min_indicators: 2,
            indicators: strings(&[
                r"responsibilit",
                r"requirements?",
                r"qualifications?",
                r"experience",
                r"skills",
                r"job\s+description",
                r"role\s+description",
                r"position\s+description",
                r"what\s+you(?:'ll|\s+will)\s+do",
                r"what\s+we\s+offer",
                r"benefits",
                r"salary|compensation",
                r"apply\s+now",
                r"submit\s+(?:your\s+)?application",
            ]),
            not_found_markers: strings(&[
                r"404.*error",
                r"error.*404",
                r"page.*not.*found",
                r"sorry.*couldn'?t.*find",
                r"job.*posting.*(?:might|may).*have.*closed",
                r"job.*posting.*(?:has\s+been\s+)?removed",
                r"not found.*404",
                r"job.*you'?re.*looking.*for.*(?:might|may).*have.*closed",
                r"position\s+(?:is\s+)?no\s+longer\s+available",
            ]),
            title_markers: strings(&[r"\b404\b", r"not\s+found"]),
            not_found_status_codes: vec![404, 410],
            length_weight: 0.5,
            indicator_weight: 0.5,
            length_saturation: 1000,
        }
    }

    /// Indicators and markers for Google Forms.
    pub fn for_forms() -> Self {
        Self {
            min_length: 500,
            min_indicators: 2,
            indicators: strings(&[
                r"\bform\b",
                r"questions?",
                r"\brequired\b",
                r"\boptional\b",
                r"\bsubmit\b",
                r"responses?",
                r"\banswer",
                r"multiple\s+choice",
                r"checkbox",
                r"dropdown",
                r"text\s+field",
                r"\bemail\b",
                r"\bname\b",
                r"\bphone\b",
                r"google\s+forms",
                r"powered\s+by\s+google",
            ]),
            not_found_markers: strings(&[
                r"page\s+not\s+found",
                r"form\s+not\s+found",
                r"form\s+has\s+been\s+deleted",
                r"no\s+longer\s+accepting\s+responses",
                r"is\s+not\s+accepting\s+responses",
                r"error\s+404",
            ]),
            title_markers: strings(&[r"\b404\b", r"not\s+found"]),
            not_found_status_codes: vec![404, 410],
            length_weight: 0.5,
            indicator_weight: 0.5,
            length_saturation: 1000,
        }
    }

    /// Built-in profile for an extraction kind.
    pub fn for_kind(kind: ExtractionKind) -> Self {
        match kind {
            ExtractionKind::JobPosting => Self::for_jobs(),
            ExtractionKind::GoogleForm => Self::for_forms(),
        }
    }

    /// Set the minimum content length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Set the minimum indicator count.
    pub fn with_min_indicators(mut self, min_indicators: usize) -> Self {
        self.min_indicators = min_indicators;
        self
    }

    /// Replace the indicator patterns.
    pub fn with_indicators(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.indicators = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a body not-found marker.
    pub fn with_not_found_marker(mut self, pattern: impl Into<String>) -> Self {
        self.not_found_markers.push(pattern.into());
        self
    }
}

/// Weights for the confidence blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Default: 0.4.
    pub ai_weight: f64,

    /// Default: 0.6.
    pub validation_weight: f64,

    /// Added when every scoring field is present. May be zero.
    ///
    /// Default: 0.05.
    pub completeness_bonus: f64,

    /// |ai - validation| above this adds a mismatch note.
    pub mismatch_threshold: f64,

    /// Final confidence below this adds a manual-review note.
    pub review_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ai_weight: 0.4,
            validation_weight: 0.6,
            completeness_bonus: 0.05,
            mismatch_threshold: 0.3,
            review_threshold: 0.3,
        }
    }
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both weights.
    pub fn with_weights(mut self, ai_weight: f64, validation_weight: f64) -> Self {
        self.ai_weight = ai_weight;
        self.validation_weight = validation_weight;
        self
    }

    /// Set the completeness bonus.
    pub fn with_bonus(mut self, bonus: f64) -> Self {
        self.completeness_bonus = bonus;
        self
    }

    /// Weights must be non-negative and sum to one; bonus must be in [0, 1].
    pub fn validate(&self) -> Result<(), ScoringError> {
        let weights_ok = self.ai_weight >= 0.0
            && self.validation_weight >= 0.0
            && ((self.ai_weight + self.validation_weight) - 1.0).abs() < 1e-6;
        if !weights_ok {
            return Err(ScoringError::InvalidWeights {
                ai_weight: self.ai_weight,
                validation_weight: self.validation_weight,
            });
        }
        if !(0.0..=1.0).contains(&self.completeness_bonus) {
            return Err(ScoringError::InvalidBonus(self.completeness_bonus));
        }
        Ok(())
    }
}

/// Model call settings for the extraction requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Model identifier passed to the language model service.
    ///
    /// Default: "gpt-4o".
    pub model: String,

    /// Sampling temperature.
    ///
    /// Default: 0.1.
    pub temperature: f32,

    /// Output-token cap; the schema's default when unset.
    pub max_output_tokens: Option<u32>,

    /// Content budget in characters; the schema's default when unset.
    pub max_content_chars: Option<usize>,

    /// Also extract `poor` content.
    ///
    /// Default: false.
    pub allow_poor: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_output_tokens: None,
            max_content_chars: None,
            allow_poor: false,
        }
    }
}

impl ExtractionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the content budget.
    pub fn with_max_content_chars(mut self, chars: usize) -> Self {
        self.max_content_chars = Some(chars);
        self
    }

    /// Set the output-token cap.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Allow extraction of `poor` content.
    pub fn with_allow_poor(mut self, allow: bool) -> Self {
        self.allow_poor = allow;
        self
    }
}

/// Batch limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// URLs processed in parallel.
    ///
    /// Default: 4.
    pub concurrency: usize,

    /// Largest accepted batch.
    ///
    /// Default: 50.
    pub max_urls: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_urls: 50,
        }
    }
}

impl BatchConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }
}

/// Everything a batch runner needs, grouped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub extraction: ExtractionConfig,
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Defaults with the classifier profile for `kind`.
    pub fn for_kind(kind: ExtractionKind) -> Self {
        Self {
            classifier: ClassifierConfig::for_kind(kind),
            ..Default::default()
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
