//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Per-URL failures
//! (`FetchError`, `ExtractionError`) are recorded on the session and never
//! abort a batch; `PipelineError` is reserved for batch-level faults.

use thiserror::Error;

use crate::types::quality::VerdictKind;
use crate::types::session::SessionStatus;

/// Errors surfaced by a [`Fetcher`](crate::traits::fetcher::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target explicitly reported the resource as missing or removed.
    #[error("page not found: {url} (status {status})")]
    NotFound { url: String, status: u16 },

    /// The fetch service answered with a non-success status.
    #[error("fetch service returned {status} for {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Connection could not be established at all.
    #[error("unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// The fetch service succeeded but returned no content.
    #[error("empty response for: {url}")]
    EmptyResponse { url: String },
}

impl FetchError {
    /// True when the failure is an explicit not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// True when the target could not be reached (as opposed to answering badly).
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            FetchError::Unreachable { .. } | FetchError::Timeout { .. }
        )
    }

    /// Status code carried by the failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { status, .. } | FetchError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Errors surfaced by a [`LanguageModel`](crate::traits::llm::LanguageModel).
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Network or transport failure.
    #[error("model service unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its deadline.
    #[error("model call timed out")]
    Timeout,

    /// The service rejected the request.
    #[error("model API error: {0}")]
    Api(String),

    /// The service answered without any completion text.
    #[error("model returned an empty completion")]
    EmptyCompletion,
}

/// Errors that can occur while extracting a record from qualifying content.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Called with content whose verdict does not permit extraction.
    #[error("content with verdict '{verdict}' is not eligible for extraction")]
    NotExtractable { verdict: VerdictKind },

    /// The model call failed or timed out.
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    /// The model response could not be parsed into a JSON object.
    #[error("unparsable model response: {reason}")]
    Unparsable { reason: String },
}

impl ExtractionError {
    /// Create an unparsable-response error.
    pub fn unparsable(reason: impl Into<String>) -> Self {
        Self::Unparsable {
            reason: reason.into(),
        }
    }
}

/// Contract violations detected by the confidence scorer.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The schema marks no field as required for scoring.
    #[error("schema has no fields marked required for scoring")]
    NoScoringFields,

    /// Weights must be non-negative and sum to one.
    #[error("invalid weights: ai={ai_weight}, validation={validation_weight} (must be >= 0 and sum to 1)")]
    InvalidWeights {
        ai_weight: f64,
        validation_weight: f64,
    },

    /// Bonus must lie in [0, 1].
    #[error("invalid completeness bonus: {0}")]
    InvalidBonus(f64),
}

/// Contract violations on a session's state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A batch must contain at least one URL.
    #[error("batch contains no URLs")]
    EmptyBatch,

    /// Batch larger than the configured maximum.
    #[error("batch of {count} URLs exceeds the maximum of {max}")]
    TooManyUrls { count: usize, max: usize },

    /// The session already reached `completed` or `failed`.
    #[error("session {id} is {status} and no longer accepts changes")]
    Terminal { id: uuid::Uuid, status: SessionStatus },

    /// URL was not part of the submitted batch.
    #[error("URL is not part of this batch: {url}")]
    UnknownUrl { url: String },

    /// URL already has a recorded outcome.
    #[error("outcome already recorded for: {url}")]
    AlreadyRecorded { url: String },
}

/// Errors from a [`ResultStore`](crate::traits::store::ResultStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend operation failed
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored data could not be (de)serialized
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Invalid component configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Scoring weights rejected.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Any other rejected value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Batch-level faults. These move a session to `failed` or prevent it
/// from being created at all.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Session state machine rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for language model calls.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for batch operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = FetchError::NotFound {
            url: "https://example.com/job".into(),
            status: 404,
        };
        assert!(err.is_not_found());
        assert!(!err.is_unreachable());
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn timeout_counts_as_unreachable() {
        let err = FetchError::Timeout {
            url: "https://example.com".into(),
        };
        assert!(err.is_unreachable());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn terminal_error_mentions_status() {
        let err = SessionError::Terminal {
            id: uuid::Uuid::nil(),
            status: SessionStatus::Completed,
        };
        assert!(err.to_string().contains("completed"));
    }
}
