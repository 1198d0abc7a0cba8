//! Confidence scoring.
//!
//! `final = ai_weight * ai + validation_weight * validation (+ bonus when
//! every scoring field is present)`, capped at 1.0. Deterministic, with no
//! I/O, and monotone in both inputs.

use crate::error::ScoringError;
use crate::types::config::ScoringConfig;
use crate::types::confidence::ConfidenceScore;
use crate::types::record::{ExtractionResult, FieldSpec};

/// Blends model self-assessment with objective completeness.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl ConfidenceScorer {
    /// Validate weights and bonus up front.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score an extraction against the fields marked required for scoring.
    pub fn score(
        &self,
        result: &ExtractionResult,
        fields: &[FieldSpec],
    ) -> Result<ConfidenceScore, ScoringError> {
        let scoring: Vec<&FieldSpec> = fields.iter().filter(|f| f.required_for_scoring).collect();
        if scoring.is_empty() {
            return Err(ScoringError::NoScoringFields);
        }

        let present = scoring
            .iter()
            .filter(|f| result.record.is_present(&f.name))
            .count();
        let validation = present as f64 / scoring.len() as f64;
        let complete = present == scoring.len();

        Ok(self.combine(result.ai_confidence, validation, complete))
    }

    /// Blend two confidences. `complete` grants the bonus.
    pub fn combine(&self, ai_confidence: f64, validation_confidence: f64, complete: bool) -> ConfidenceScore {
        let ai = clamp_unit(ai_confidence);
        let validation = clamp_unit(validation_confidence);
        let bonus = if complete { self.config.completeness_bonus } else { 0.0 };

        let blended = self.config.ai_weight * ai + self.config.validation_weight * validation;
        let final_confidence = (blended + bonus).clamp(0.0, 1.0);

        let mut notes = Vec::new();
        if (ai - validation).abs() > self.config.mismatch_threshold {
            notes.push(format!(
                "Confidence mismatch detected: AI={:.2}, Validation={:.2}",
                ai, validation
            ));
        }
        if final_confidence < self.config.review_threshold {
            notes.push("Low confidence extraction - manual review recommended".to_string());
        }

        ConfidenceScore {
            ai_confidence: ai,
            validation_confidence: validation,
            final_confidence,
            bonus_applied: bonus,
            notes,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
