//! Session tracker: the state machine behind a batch.
//!
//! ```text
//! pending --first outcome--> processing --all recorded--> completed
//!    |                            |
//!    +-------- fail(reason) ------+-----------------------> failed
//! ```
//!
//! Terminal states are immutable; any further call is an error. A batch
//! in which every URL was unreachable also ends `failed`, since no
//! collaborator was reachable for any URL.

use chrono::Utc;
use indexmap::IndexSet;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::types::record::ExtractionKind;
use crate::types::session::{
    FailureKind, OutcomeStatus, SessionState, SessionStatus, UrlOutcome, VerdictCounts,
};

/// Exclusive owner of one batch's [`SessionState`].
#[derive(Debug)]
pub struct SessionTracker {
    state: SessionState,
    pending: HashSet<String>,
}

impl SessionTracker {
    /// Start a batch. Duplicate URLs are collapsed, keeping first-seen order.
    pub fn new(
        id: Uuid,
        kind: ExtractionKind,
        urls: impl IntoIterator<Item = impl Into<String>>,
        caller_id: Option<String>,
    ) -> SessionResult<Self> {
        let unique: IndexSet<String> = urls
            .into_iter()
            .map(Into::into)
            .map(|u: String| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if unique.is_empty() {
            return Err(SessionError::EmptyBatch);
        }

        let urls: Vec<String> = unique.into_iter().collect();
        let total = urls.len();

        let mut tracker = Self {
            pending: urls.iter().cloned().collect(),
            state: SessionState {
                id,
                kind,
                caller_id,
                urls,
                total_urls: total,
                processed_urls: 0,
                successful_urls: 0,
                skipped_urls: 0,
                failed_urls: 0,
                verdicts: VerdictCounts::default(),
                progress_percentage: 0.0,
                status: SessionStatus::Pending,
                summary: String::new(),
                error: None,
                started_at: Utc::now(),
                completed_at: None,
                outcomes: Vec::new(),
            },
        };
        tracker.state.summary = tracker.render_summary();
        Ok(tracker)
    }

    /// Like [`new`](Self::new) but rejects batches above `max_urls`
    /// (counted after de-duplication).
    pub fn with_limit(
        id: Uuid,
        kind: ExtractionKind,
        urls: impl IntoIterator<Item = impl Into<String>>,
        caller_id: Option<String>,
        max_urls: usize,
    ) -> SessionResult<Self> {
        let tracker = Self::new(id, kind, urls, caller_id)?;
        if tracker.state.total_urls > max_urls {
            return Err(SessionError::TooManyUrls {
                count: tracker.state.total_urls,
                max: max_urls,
            });
        }
        Ok(tracker)
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn urls(&self) -> &[String] {
        &self.state.urls
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Owned copy for persistence or display.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    /// Record one URL's outcome.
    pub fn record_outcome(&mut self, outcome: UrlOutcome) -> SessionResult<&SessionState> {
        self.ensure_open()?;

        if !self.pending.remove(&outcome.url) {
            return Err(if self.state.urls.contains(&outcome.url) {
                SessionError::AlreadyRecorded { url: outcome.url }
            } else {
                SessionError::UnknownUrl { url: outcome.url }
            });
        }

        let state = &mut self.state;
        state.status = SessionStatus::Processing;
        state.processed_urls += 1;
        match outcome.status {
            OutcomeStatus::Succeeded => state.successful_urls += 1,
            OutcomeStatus::Skipped => state.skipped_urls += 1,
            OutcomeStatus::Failed => state.failed_urls += 1,
        }
        state.verdicts.increment(outcome.verdict);
        state.progress_percentage =
            state.processed_urls as f64 / state.total_urls as f64 * 100.0;
        state.outcomes.push(outcome);

        if state.processed_urls == state.total_urls {
            let all_unreachable = state
                .outcomes
                .iter()
                .all(|o| o.failure == Some(FailureKind::Unreachable));
            if all_unreachable {
                state.status = SessionStatus::Failed;
                state.error = Some("no URL in the batch could be reached".to_string());
            } else {
                state.status = SessionStatus::Completed;
            }
            state.completed_at = Some(Utc::now());
        }

        self.state.summary = self.render_summary();
        Ok(&self.state)
    }

    /// Mark the batch failed (operator abort or other batch-level fault).
    pub fn fail(&mut self, reason: impl Into<String>) -> SessionResult<&SessionState> {
        self.ensure_open()?;
        self.state.status = SessionStatus::Failed;
        self.state.error = Some(reason.into());
        self.state.completed_at = Some(Utc::now());
        self.state.summary = self.render_summary();
        Ok(&self.state)
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.state.status.is_terminal() {
            return Err(SessionError::Terminal {
                id: self.state.id,
                status: self.state.status,
            });
        }
        Ok(())
    }

    fn render_summary(&self) -> String {
        let s = &self.state;
        let v = &s.verdicts;

        let verdicts: Vec<String> = [
            (v.good, "good"),
            (v.poor, "poor"),
            (v.invalid, "invalid"),
            (v.not_found, "not_found"),
            (v.unclassified, "unclassified"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();

        let mut summary = format!("{}/{} processed", s.processed_urls, s.total_urls);
        if !verdicts.is_empty() {
            summary.push_str(": ");
            summary.push_str(&verdicts.join(", "));
        }
        summary.push_str(&format!(
            "; {} succeeded, {} skipped, {} failed",
            s.successful_urls, s.skipped_urls, s.failed_urls
        ));
        if let Some(error) = &s.error {
            summary.push_str(&format!(" ({})", error));
        }
        summary
    }
}
