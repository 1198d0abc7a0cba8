//! Final trust score attached to an extraction.

use serde::{Deserialize, Serialize};

/// Blend of the model's self-assessment and an objective completeness check.
///
/// All three numbers lie in [0, 1]. `notes` are advisory only and never
/// influence the numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub ai_confidence: f64,
    pub validation_confidence: f64,
    pub final_confidence: f64,
    /// Completeness bonus actually added (0 when any scoring field was missing).
    pub bonus_applied: f64,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl ConfidenceScore {
    /// Whether the score is below the manual-review threshold.
    pub fn needs_review(&self, threshold: f64) -> bool {
        self.final_confidence < threshold
    }
}
