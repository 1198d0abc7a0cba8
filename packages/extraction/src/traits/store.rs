//! Storage trait for extraction results, session snapshots, and logs.
//!
//! The store never owns a session. It receives snapshots and must keep the
//! newest one: a snapshot with fewer processed URLs than the stored one, or
//! any snapshot arriving after a terminal one, is ignored. This lets batch
//! workers persist without holding the session lock.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::session::{ProcessingLogEntry, SessionState};
use crate::types::stored::{ResultFilter, StoreStats, StoredExtraction};

/// Persistence collaborator.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert or replace the result for `stored.url`.
    ///
    /// Returns the id of the stored row. When the URL already existed the
    /// original id is kept.
    async fn upsert_result(&self, stored: &StoredExtraction) -> StoreResult<Uuid>;

    /// Get a result by id.
    async fn get_result(&self, id: Uuid) -> StoreResult<Option<StoredExtraction>>;

    /// Get a result by URL.
    async fn get_result_by_url(&self, url: &str) -> StoreResult<Option<StoredExtraction>>;

    /// Newest results first.
    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<StoredExtraction>>;

    /// Case-insensitive search over URL and title, newest first.
    async fn search_results(
        &self,
        query: &str,
        filter: &ResultFilter,
    ) -> StoreResult<Vec<StoredExtraction>>;

    /// Save a session snapshot (see module docs for ordering rules).
    async fn save_session(&self, state: &SessionState) -> StoreResult<()>;

    /// Get the latest snapshot of a session.
    async fn get_session(&self, id: Uuid) -> StoreResult<Option<SessionState>>;

    /// Newest sessions first, optionally for one caller.
    async fn list_sessions(
        &self,
        caller_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SessionState>>;

    /// Append processing log entries.
    async fn append_logs(&self, entries: &[ProcessingLogEntry]) -> StoreResult<()>;

    /// Log entries for a session in insertion order.
    async fn session_logs(&self, session_id: Uuid) -> StoreResult<Vec<ProcessingLogEntry>>;

    /// Result and session counts.
    async fn stats(&self) -> StoreResult<StoreStats>;

    /// Cheap reachability check.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Store name for logging.
    fn name(&self) -> &str;
}

/// Whether `incoming` may replace `existing`.
pub fn snapshot_supersedes(existing: &SessionState, incoming: &SessionState) -> bool {
    !existing.status.is_terminal() && incoming.processed_urls >= existing.processed_urls
}

#[async_trait]
impl<S: ResultStore + ?Sized> ResultStore for Arc<S> {
    async fn upsert_result(&self, stored: &StoredExtraction) -> StoreResult<Uuid> {
        (**self).upsert_result(stored).await
    }

    async fn get_result(&self, id: Uuid) -> StoreResult<Option<StoredExtraction>> {
        (**self).get_result(id).await
    }

    async fn get_result_by_url(&self, url: &str) -> StoreResult<Option<StoredExtraction>> {
        (**self).get_result_by_url(url).await
    }

    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<StoredExtraction>> {
        (**self).list_results(filter).await
    }

    async fn search_results(
        &self,
        query: &str,
        filter: &ResultFilter,
    ) -> StoreResult<Vec<StoredExtraction>> {
        (**self).search_results(query, filter).await
    }

    async fn save_session(&self, state: &SessionState) -> StoreResult<()> {
        (**self).save_session(state).await
    }

    async fn get_session(&self, id: Uuid) -> StoreResult<Option<SessionState>> {
        (**self).get_session(id).await
    }

    async fn list_sessions(
        &self,
        caller_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SessionState>> {
        (**self).list_sessions(caller_id, limit).await
    }

    async fn append_logs(&self, entries: &[ProcessingLogEntry]) -> StoreResult<()> {
        (**self).append_logs(entries).await
    }

    async fn session_logs(&self, session_id: Uuid) -> StoreResult<Vec<ProcessingLogEntry>> {
        (**self).session_logs(session_id).await
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        (**self).stats().await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
