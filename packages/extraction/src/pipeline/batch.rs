//! Batch runner: bounded-concurrency processing of a URL batch.
//!
//! Each URL goes fetch -> classify -> extract -> score -> store. Per-URL
//! failures become outcomes on the session and never abort the batch. At
//! most `concurrency` URLs are in flight at once. Every recorded outcome
//! is followed by a snapshot save, so callers polling the store see the
//! counters move.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{ConfigResult, FetchError, PipelineResult};
use crate::pipeline::classify::QualityClassifier;
use crate::pipeline::extract::ExtractionRequester;
use crate::pipeline::score::ConfidenceScorer;
use crate::pipeline::session::SessionTracker;
use crate::traits::fetcher::Fetcher;
use crate::traits::llm::LanguageModel;
use crate::traits::store::ResultStore;
use crate::types::config::{BatchConfig, PipelineConfig};
use crate::types::confidence::ConfidenceScore;
use crate::types::content::RawContent;
use crate::types::quality::QualityVerdict;
use crate::types::record::{ExtractionKind, ExtractionResult, ExtractionSchema};
use crate::types::session::{
    FailureKind, LogLevel, LogStage, OutcomeStatus, ProcessingLogEntry, SessionState,
    UrlOutcome, UrlPreview,
};
use crate::types::stored::StoredExtraction;
use crate::urls::source_label;

/// Reason recorded when a batch is aborted through its cancellation token.
pub const CANCELLED_REASON: &str = "cancelled by operator";

/// One URL's outcome plus the log lines produced on the way.
struct Processed {
    outcome: UrlOutcome,
    logs: Vec<ProcessingLogEntry>,
}

/// Where evaluation of one URL ended.
enum Stage {
    /// Failed or skipped before a score existed.
    Stopped {
        verdict: Option<QualityVerdict>,
        outcome: UrlOutcome,
    },
    /// Ready to store.
    Scored {
        content: RawContent,
        verdict: QualityVerdict,
        result: ExtractionResult,
        score: ConfidenceScore,
    },
}

struct Evaluated {
    stage: Stage,
    logs: Vec<ProcessingLogEntry>,
}

/// Runs batches of one extraction kind.
pub struct BatchRunner {
    fetcher: Arc<dyn Fetcher>,
    classifier: QualityClassifier,
    requester: ExtractionRequester,
    scorer: ConfidenceScorer,
    store: Arc<dyn ResultStore>,
    batch: BatchConfig,
}

impl BatchRunner {
    /// Build a runner. Fails if the classifier patterns or scoring weights
    /// are invalid.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn ResultStore>,
        config: &PipelineConfig,
        schema: ExtractionSchema,
    ) -> ConfigResult<Self> {
        Ok(Self {
            fetcher,
            classifier: QualityClassifier::new(config.classifier.clone())?,
            requester: ExtractionRequester::new(model, schema, config.extraction.clone()),
            scorer: ConfidenceScorer::new(config.scoring.clone())?,
            store,
            batch: config.batch.clone(),
        })
    }

    pub fn kind(&self) -> ExtractionKind {
        self.requester.schema().kind
    }

    pub fn schema(&self) -> &ExtractionSchema {
        self.requester.schema()
    }

    pub fn classifier(&self) -> &QualityClassifier {
        &self.classifier
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Validate the batch and persist its `pending` snapshot.
    pub async fn create_session(
        &self,
        urls: Vec<String>,
        caller_id: Option<String>,
    ) -> PipelineResult<SessionTracker> {
        let tracker = SessionTracker::with_limit(
            Uuid::new_v4(),
            self.kind(),
            urls,
            caller_id,
            self.batch.max_urls,
        )?;
        self.store.save_session(&tracker.snapshot()).await?;

        info!(
            session_id = %tracker.id(),
            kind = %self.kind(),
            total_urls = tracker.urls().len(),
            "Created extraction session"
        );
        Ok(tracker)
    }

    /// Create a session and process it to completion.
    pub async fn run(&self, urls: Vec<String>, caller_id: Option<String>) -> PipelineResult<SessionState> {
        let tracker = self.create_session(urls, caller_id).await?;
        self.execute(tracker, CancellationToken::new()).await
    }

    /// Create a session and process it in the background.
    ///
    /// Returns the `pending` snapshot immediately; progress is observable
    /// through the store.
    pub async fn spawn(
        self: &Arc<Self>,
        urls: Vec<String>,
        caller_id: Option<String>,
        cancel: CancellationToken,
    ) -> PipelineResult<SessionState> {
        let tracker = self.create_session(urls, caller_id).await?;
        let snapshot = tracker.snapshot();

        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let session_id = tracker.id();
            if let Err(e) = runner.execute(tracker, cancel).await {
                error!(session_id = %session_id, error = %e, "Background batch failed");
            }
        });

        Ok(snapshot)
    }

    /// Process every URL of `tracker`, then return the terminal snapshot.
    ///
    /// Cancelling `cancel` stops new work, drops in-flight URLs, and moves
    /// the session to `failed`.
    pub async fn execute(
        &self,
        tracker: SessionTracker,
        cancel: CancellationToken,
    ) -> PipelineResult<SessionState> {
        let session_id = tracker.id();
        let urls = tracker.urls().to_vec();
        let tracker = Mutex::new(tracker);

        info!(
            session_id = %session_id,
            kind = %self.kind(),
            total_urls = urls.len(),
            concurrency = self.batch.concurrency,
            "Starting batch"
        );

        stream::iter(urls)
            .map(|url| self.process_url(session_id, url))
            .buffer_unordered(self.batch.concurrency.max(1))
            .take_until(cancel.cancelled())
            .for_each_concurrent(None, |processed| self.record(&tracker, processed))
            .await;

        let mut tracker = tracker.into_inner();
        if !tracker.status().is_terminal() {
            let reason = if cancel.is_cancelled() {
                CANCELLED_REASON
            } else {
                "batch ended before every URL was processed"
            };
            tracker.fail(reason)?;
        }

        let state = tracker.snapshot();
        self.store.save_session(&state).await?;

        info!(
            session_id = %session_id,
            status = %state.status,
            summary = %state.summary,
            "Batch finished"
        );
        Ok(state)
    }

    /// Record one outcome and persist the resulting snapshot and logs.
    async fn record(&self, tracker: &Mutex<SessionTracker>, processed: Processed) {
        let Processed { outcome, logs } = processed;
        let url = outcome.url.clone();

        let snapshot = {
            let mut tracker = tracker.lock().await;
            match tracker.record_outcome(outcome) {
                Ok(state) => state.clone(),
                Err(e) => {
                    warn!(url = %url, error = %e, "Outcome rejected by session");
                    return;
                }
            }
        };

        if let Err(e) = self.store.append_logs(&logs).await {
            warn!(session_id = %snapshot.id, error = %e, "Failed to persist processing logs");
        }
        if let Err(e) = self.store.save_session(&snapshot).await {
            warn!(session_id = %snapshot.id, error = %e, "Failed to persist session snapshot");
        }
    }

    /// Run one URL through fetch, classify, extract and score without
    /// storing anything.
    ///
    /// Log lines carry the nil session id.
    pub async fn preview(&self, url: &str) -> UrlPreview {
        let Evaluated { stage, logs } = self.evaluate(Uuid::nil(), url).await;
        let preview = match stage {
            Stage::Stopped { verdict, outcome } => UrlPreview {
                url: url.to_string(),
                kind: self.kind(),
                status: outcome.status,
                verdict,
                result: None,
                confidence: None,
                failure: outcome.failure,
                message: outcome.message,
                logs,
            },
            Stage::Scored {
                verdict,
                result,
                score,
                ..
            } => UrlPreview {
                url: url.to_string(),
                kind: self.kind(),
                status: OutcomeStatus::Succeeded,
                verdict: Some(verdict),
                result: Some(result),
                confidence: Some(score),
                failure: None,
                message: None,
                logs,
            },
        };

        info!(url = %url, status = ?preview.status, "Previewed URL");
        preview
    }

    /// Run one URL through every stage. Never fails; failures are outcomes.
    async fn process_url(&self, session_id: Uuid, url: String) -> Processed {
        let Evaluated { stage, mut logs } = self.evaluate(session_id, &url).await;
        let (content, verdict, result, score) = match stage {
            Stage::Stopped { outcome, .. } => return Processed { outcome, logs },
            Stage::Scored {
                content,
                verdict,
                result,
                score,
            } => (content, verdict, result, score),
        };

        let final_confidence = score.final_confidence;
        let verdict_kind = verdict.kind;
        let stored = StoredExtraction::new(
            Some(session_id),
            content.content_hash(),
            verdict,
            result,
            score,
        );

        let mut log = |stage: LogStage, level: LogLevel, message: String| {
            logs.push(ProcessingLogEntry::new(session_id, url.clone(), stage, level, message));
        };
        match self.store.upsert_result(&stored).await {
            Ok(id) => {
                info!(
                    url = %url,
                    result_id = %id,
                    final_confidence = final_confidence,
                    "Stored extraction"
                );
                log(
                    LogStage::Storage,
                    LogLevel::Info,
                    format!("stored as {}", id),
                );
                log(LogStage::Completed, LogLevel::Info, "processing completed".to_string());
                Processed {
                    outcome: UrlOutcome::succeeded(url.clone(), verdict_kind, final_confidence, id),
                    logs,
                }
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to store extraction");
                log(LogStage::Storage, LogLevel::Error, e.to_string());
                Processed {
                    outcome: UrlOutcome::failed(
                        url.clone(),
                        Some(verdict_kind),
                        FailureKind::Storage,
                        e.to_string(),
                    ),
                    logs,
                }
            }
        }
    }

    /// Fetch, classify, extract and score one URL.
    async fn evaluate(&self, session_id: Uuid, url: &str) -> Evaluated {
        let mut logs = Vec::new();
        let mut log = |stage: LogStage, level: LogLevel, message: String| {
            logs.push(ProcessingLogEntry::new(session_id, url, stage, level, message));
        };

        let content = match self.fetcher.fetch(url).await {
            Ok(content) => {
                debug!(url = %url, chars = content.char_len(), "Fetched page");
                let message = match source_label(self.kind(), url) {
                    Some(label) => format!("fetched {} characters ({})", content.char_len(), label),
                    None => format!("fetched {} characters", content.char_len()),
                };
                log(LogStage::Fetch, LogLevel::Info, message);
                content
            }
            Err(FetchError::NotFound { status, .. }) => {
                log(
                    LogStage::Fetch,
                    LogLevel::Warning,
                    format!("target reported status {}", status),
                );
                RawContent::new(url, "").with_status_code(status)
            }
            Err(e) => {
                let failure = if e.is_unreachable() {
                    FailureKind::Unreachable
                } else {
                    FailureKind::Fetch
                };
                warn!(url = %url, error = %e, "Fetch failed");
                log(LogStage::Fetch, LogLevel::Error, e.to_string());
                return Evaluated {
                    stage: Stage::Stopped {
                        verdict: None,
                        outcome: UrlOutcome::failed(url, None, failure, e.to_string()),
                    },
                    logs,
                };
            }
        };

        let verdict = self.classifier.classify(&content);
        log(
            LogStage::Classification,
            LogLevel::Info,
            format!("{} ({:.2}): {}", verdict.kind, verdict.score, verdict.reason),
        );

        if !verdict.is_extractable(self.requester.config().allow_poor) {
            debug!(url = %url, verdict = %verdict.kind, "Skipping extraction");
            let outcome = UrlOutcome::skipped(url, verdict.kind, verdict.reason.clone());
            return Evaluated {
                stage: Stage::Stopped {
                    verdict: Some(verdict),
                    outcome,
                },
                logs,
            };
        }

        let result = match self.requester.extract(&content, &verdict).await {
            Ok(result) => {
                log(
                    LogStage::Extraction,
                    LogLevel::Info,
                    format!(
                        "extracted {} fields (ai confidence {:.2}{})",
                        result.record.iter().filter(|(_, v)| v.is_present()).count(),
                        result.ai_confidence,
                        if result.truncated { ", truncated" } else { "" }
                    ),
                );
                result
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Extraction failed");
                log(LogStage::Extraction, LogLevel::Error, e.to_string());
                let outcome = UrlOutcome::failed(
                    url,
                    Some(verdict.kind),
                    FailureKind::Extraction,
                    e.to_string(),
                );
                return Evaluated {
                    stage: Stage::Stopped {
                        verdict: Some(verdict),
                        outcome,
                    },
                    logs,
                };
            }
        };

        let score = match self.scorer.score(&result, &self.requester.schema().fields) {
            Ok(score) => {
                let level = if score.notes.is_empty() {
                    LogLevel::Info
                } else {
                    LogLevel::Warning
                };
                let mut message = format!("final confidence {:.2}", score.final_confidence);
                for note in &score.notes {
                    message.push_str("; ");
                    message.push_str(note);
                }
                log(LogStage::Scoring, level, message);
                score
            }
            Err(e) => {
                log(LogStage::Scoring, LogLevel::Error, e.to_string());
                let outcome = UrlOutcome::failed(
                    url,
                    Some(verdict.kind),
                    FailureKind::Scoring,
                    e.to_string(),
                );
                return Evaluated {
                    stage: Stage::Stopped {
                        verdict: Some(verdict),
                        outcome,
                    },
                    logs,
                };
            }
        };

        Evaluated {
            stage: Stage::Scored {
                content,
                verdict,
                result,
                score,
            },
            logs,
        }
    }
}
