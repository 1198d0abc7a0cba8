//! Batch session state and per-URL outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::confidence::ConfidenceScore;
use super::quality::{QualityVerdict, VerdictKind};
use super::record::{ExtractionKind, ExtractionResult};

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "processing" => Ok(SessionStatus::Processing),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

/// Which bucket a processed URL lands in. Every outcome lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Extracted, scored, and stored.
    Succeeded,
    /// Classified as not worth extracting. Not a failure.
    Skipped,
    /// Fetch, extraction, scoring, or storage failed.
    Failed,
}

/// Stage at which a failed URL gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Fetch service answered with an error.
    Fetch,
    /// Target or fetch service could not be reached at all.
    Unreachable,
    Extraction,
    Scoring,
    Storage,
}

/// Record of one URL's processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    /// Absent when the content was never classified.
    pub verdict: Option<VerdictKind>,
    pub status: OutcomeStatus,
    pub failure: Option<FailureKind>,
    pub message: Option<String>,
    pub final_confidence: Option<f64>,
    pub result_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

impl UrlOutcome {
    fn base(url: impl Into<String>, verdict: Option<VerdictKind>, status: OutcomeStatus) -> Self {
        Self {
            url: url.into(),
            verdict,
            status,
            failure: None,
            message: None,
            final_confidence: None,
            result_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn succeeded(
        url: impl Into<String>,
        verdict: VerdictKind,
        final_confidence: f64,
        result_id: Uuid,
    ) -> Self {
        let mut outcome = Self::base(url, Some(verdict), OutcomeStatus::Succeeded);
        outcome.final_confidence = Some(final_confidence);
        outcome.result_id = Some(result_id);
        outcome
    }

    pub fn skipped(url: impl Into<String>, verdict: VerdictKind, reason: impl Into<String>) -> Self {
        let mut outcome = Self::base(url, Some(verdict), OutcomeStatus::Skipped);
        outcome.message = Some(reason.into());
        outcome
    }

    pub fn failed(
        url: impl Into<String>,
        verdict: Option<VerdictKind>,
        failure: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::base(url, verdict, OutcomeStatus::Failed);
        outcome.failure = Some(failure);
        outcome.message = Some(message.into());
        outcome
    }
}

/// Dry-run outcome for one URL: everything a batch would store, without
/// storing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPreview {
    pub url: String,
    pub kind: ExtractionKind,
    pub status: OutcomeStatus,
    pub verdict: Option<QualityVerdict>,
    pub result: Option<ExtractionResult>,
    pub confidence: Option<ConfidenceScore>,
    pub failure: Option<FailureKind>,
    pub message: Option<String>,
    pub logs: Vec<ProcessingLogEntry>,
}

/// Count of processed URLs per verdict. `unclassified` covers URLs whose
/// content never reached the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub good: usize,
    pub poor: usize,
    pub invalid: usize,
    pub not_found: usize,
    pub unclassified: usize,
}

impl VerdictCounts {
    pub fn increment(&mut self, verdict: Option<VerdictKind>) {
        match verdict {
            Some(VerdictKind::Good) => self.good += 1,
            Some(VerdictKind::Poor) => self.poor += 1,
            Some(VerdictKind::Invalid) => self.invalid += 1,
            Some(VerdictKind::NotFound) => self.not_found += 1,
            None => self.unclassified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.good + self.poor + self.invalid + self.not_found + self.unclassified
    }
}

/// One batch submission.
///
/// Owned exclusively by a `SessionTracker`; everything else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub kind: ExtractionKind,
    pub caller_id: Option<String>,
    pub urls: Vec<String>,
    pub total_urls: usize,
    pub processed_urls: usize,
    pub successful_urls: usize,
    pub skipped_urls: usize,
    pub failed_urls: usize,
    pub verdicts: VerdictCounts,
    pub progress_percentage: f64,
    pub status: SessionStatus,
    pub summary: String,
    /// Reason for a batch-level failure.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcomes: Vec<UrlOutcome>,
}

/// Pipeline stage a log entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStage {
    Fetch,
    Classification,
    Extraction,
    Scoring,
    Storage,
    Completed,
}

impl LogStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStage::Fetch => "fetch",
            LogStage::Classification => "classification",
            LogStage::Extraction => "extraction",
            LogStage::Scoring => "scoring",
            LogStage::Storage => "storage",
            LogStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Per-stage processing log line, persisted for the detailed status view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub session_id: Uuid,
    pub url: String,
    pub stage: LogStage,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessingLogEntry {
    pub fn new(
        session_id: Uuid,
        url: impl Into<String>,
        stage: LogStage,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            url: url.into(),
            stage,
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
