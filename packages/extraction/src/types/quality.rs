//! Quality verdicts produced by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade assigned to fetched content before any paid extraction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// Enough length and domain signal to extract.
    Good,
    /// Long enough but too few domain indicators.
    Poor,
    /// Empty or too short to be useful.
    Invalid,
    /// Explicitly missing, removed, or closed.
    NotFound,
}

impl VerdictKind {
    pub const ALL: [VerdictKind; 4] = [
        VerdictKind::Good,
        VerdictKind::Poor,
        VerdictKind::Invalid,
        VerdictKind::NotFound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictKind::Good => "good",
            VerdictKind::Poor => "poor",
            VerdictKind::Invalid => "invalid",
            VerdictKind::NotFound => "not_found",
        }
    }

    /// Whether content with this grade may be sent to the model.
    pub fn is_extractable(&self, allow_poor: bool) -> bool {
        match self {
            VerdictKind::Good => true,
            VerdictKind::Poor => allow_poor,
            VerdictKind::Invalid | VerdictKind::NotFound => false,
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation that contributed to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum QualitySignal {
    /// Fetch status of the target page.
    StatusCode { code: u16, not_found: bool },

    /// A not-found marker matched the body or title.
    NotFoundMarker { pattern: String, in_title: bool },

    /// Trimmed character length against the minimum.
    Length {
        chars: usize,
        minimum: usize,
        passed: bool,
    },

    /// Domain indicator matches against the minimum.
    Indicators {
        found: usize,
        total: usize,
        minimum: usize,
        matched: Vec<String>,
        passed: bool,
    },
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub kind: VerdictKind,
    /// Weighted quality score in [0, 1]; zero for invalid and not-found.
    pub score: f64,
    pub signals: Vec<QualitySignal>,
    pub reason: String,
}

impl QualityVerdict {
    pub fn new(
        kind: VerdictKind,
        score: f64,
        signals: Vec<QualitySignal>,
        reason: impl Into<String>,
    ) -> Self {
        let score = match kind {
            VerdictKind::Invalid | VerdictKind::NotFound => 0.0,
            _ => score.clamp(0.0, 1.0),
        };
        Self {
            kind,
            score,
            signals,
            reason: reason.into(),
        }
    }

    pub fn is_extractable(&self, allow_poor: bool) -> bool {
        self.kind.is_extractable(allow_poor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&VerdictKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }

    #[test]
    fn poor_is_gated_by_flag() {
        assert!(!VerdictKind::Poor.is_extractable(false));
        assert!(VerdictKind::Poor.is_extractable(true));
        assert!(!VerdictKind::NotFound.is_extractable(true));
    }

    #[test]
    fn zero_score_for_terminal_kinds() {
        let verdict = QualityVerdict::new(VerdictKind::Invalid, 0.8, vec![], "too short");
        assert_eq!(verdict.score, 0.0);
    }
}
