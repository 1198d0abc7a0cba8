//! Persisted extraction rows and query filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::confidence::ConfidenceScore;
use super::quality::QualityVerdict;
use super::record::{ExtractionKind, ExtractionResult};

/// What a store keeps per URL. Upserted on URL uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredExtraction {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub url: String,
    pub kind: ExtractionKind,
    pub title: Option<String>,
    pub content_hash: String,
    pub verdict: QualityVerdict,
    pub result: ExtractionResult,
    pub confidence: ConfidenceScore,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredExtraction {
    pub fn new(
        session_id: Option<Uuid>,
        content_hash: impl Into<String>,
        verdict: QualityVerdict,
        result: ExtractionResult,
        confidence: ConfidenceScore,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            url: result.url.clone(),
            kind: result.kind,
            title: result.title.clone(),
            content_hash: content_hash.into(),
            verdict,
            result,
            confidence,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive match on URL or title.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.url.to_lowercase().contains(&query)
            || self
                .title
                .as_deref()
                .map(|t| t.to_lowercase().contains(&query))
                .unwrap_or(false)
    }
}

/// Store-wide counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_results: usize,
    pub total_sessions: usize,
    /// Result count per extraction kind, keyed by `ExtractionKind::as_str`.
    pub results_by_kind: BTreeMap<String, usize>,
}

/// Listing filter shared by `list_results` and `search_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFilter {
    pub kind: Option<ExtractionKind>,
    /// Session that last wrote the row. A URL re-extracted by a later
    /// session moves to that session.
    pub session_id: Option<Uuid>,
    pub min_confidence: Option<f64>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            kind: None,
            session_id: None,
            min_confidence: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ExtractionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = Some(min);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Kind, session and confidence predicates; paging is applied by the store.
    pub fn accepts(&self, stored: &StoredExtraction) -> bool {
        self.kind.map(|k| k == stored.kind).unwrap_or(true)
            && self
                .session_id
                .map(|id| stored.session_id == Some(id))
                .unwrap_or(true)
            && self
                .min_confidence
                .map(|min| stored.confidence.final_confidence >= min)
                .unwrap_or(true)
    }
}
