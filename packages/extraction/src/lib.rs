//! Quality-Gated Structured Extraction Library
//!
//! Extracts job postings and Google Forms from fetched web pages with a
//! language model, paying for the model call only when the page looks
//! worth it.
//!
//! # Design Philosophy
//!
//! - Grade content before spending on it (`good` / `poor` / `invalid` / `not_found`)
//! - Trust the model only as far as the record backs it up
//! - Per-URL failures are outcomes, never batch aborts
//! - Library handles mechanics, the service handles transport
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use extraction::{BatchRunner, ExtractionKind, MemoryStore, PipelineConfig};
//! use extraction::testing::{MockFetcher, MockModel};
//!
//! let kind = ExtractionKind::JobPosting;
//! let runner = BatchRunner::new(
//!     Arc::new(MockFetcher::new()),
//!     Arc::new(MockModel::new()),
//!     Arc::new(MemoryStore::new()),
//!     &PipelineConfig::for_kind(kind),
//!     kind.schema(),
//! )?;
//!
//! let state = runner.run(vec!["https://jobs.lever.co/acme/1".into()], None).await?;
//! println!("{}", state.summary);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (Fetcher, LanguageModel, ResultStore)
//! - [`types`] - Content, verdicts, records, scores, sessions, config
//! - [`pipeline`] - Classifier, requester, scorer, session tracker, batch runner
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`fetchers`] - Fetcher implementations (FirecrawlFetcher, RateLimitedFetcher)
//! - [`security`] - Credential handling
//! - [`urls`] - Submission validation and URL recognition
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;
pub mod urls;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{
    ConfigError, ExtractionError, FetchError, ModelError, PipelineError, ScoringError,
    SessionError, StorageError,
};
pub use traits::{
    fetcher::Fetcher,
    llm::{Completion, CompletionConstraints, LanguageModel, Prompt},
    store::ResultStore,
};
pub use types::{
    confidence::ConfidenceScore,
    config::{BatchConfig, ClassifierConfig, ExtractionConfig, PipelineConfig, ScoringConfig},
    content::RawContent,
    quality::{QualitySignal, QualityVerdict, VerdictKind},
    record::{
        ExtractedRecord, ExtractionKind, ExtractionResult, ExtractionSchema, FieldSpec, FieldType,
        FieldValue, TokenUsage,
    },
    session::{
        FailureKind, LogLevel, LogStage, OutcomeStatus, ProcessingLogEntry, SessionState,
        SessionStatus, UrlOutcome, UrlPreview, VerdictCounts,
    },
    stored::{ResultFilter, StoreStats, StoredExtraction},
};

// Re-export pipeline components
pub use pipeline::{
    BatchRunner, ConfidenceScorer, ExtractionRequester, QualityClassifier, SessionTracker,
    CANCELLED_REASON,
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

// Re-export fetchers
pub use fetchers::{FetcherExt, RateLimitedFetcher};

#[cfg(feature = "firecrawl")]
pub use fetchers::FirecrawlFetcher;

#[cfg(feature = "openai")]
pub use ai::OpenAiModel;

pub use security::{ModelCredentials, SecretString};
pub use urls::UrlError;

// Re-export testing utilities
pub use testing::{MockFetcher, MockModel};
