//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::traits::store::{snapshot_supersedes, ResultStore};
use crate::types::session::{ProcessingLogEntry, SessionState};
use crate::types::stored::{ResultFilter, StoreStats, StoredExtraction};

#[derive(Default)]
struct Results {
    by_id: HashMap<Uuid, StoredExtraction>,
    by_url: HashMap<String, Uuid>,
}

/// In-memory storage for results, session snapshots, and logs.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    results: RwLock<Results>,
    sessions: RwLock<HashMap<Uuid, SessionState>>,
    logs: RwLock<Vec<ProcessingLogEntry>>,
}

// A panicked writer leaves plain data behind; keep serving it.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        *write(&self.results) = Results::default();
        write(&self.sessions).clear();
        write(&self.logs).clear();
    }

    /// Get the number of stored results.
    pub fn result_count(&self) -> usize {
        read(&self.results).by_id.len()
    }

    /// Get the number of stored sessions.
    pub fn session_count(&self) -> usize {
        read(&self.sessions).len()
    }

    fn page(mut rows: Vec<StoredExtraction>, filter: &ResultFilter) -> Vec<StoredExtraction> {
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn upsert_result(&self, stored: &StoredExtraction) -> StoreResult<Uuid> {
        let mut results = write(&self.results);
        let mut row = stored.clone();

        if let Some(existing_id) = results.by_url.get(&stored.url).copied() {
            if let Some(existing) = results.by_id.get(&existing_id) {
                row.id = existing.id;
                row.created_at = existing.created_at;
            }
            row.updated_at = Utc::now();
        }

        let id = row.id;
        results.by_url.insert(row.url.clone(), id);
        results.by_id.insert(id, row);
        Ok(id)
    }

    async fn get_result(&self, id: Uuid) -> StoreResult<Option<StoredExtraction>> {
        Ok(read(&self.results).by_id.get(&id).cloned())
    }

    async fn get_result_by_url(&self, url: &str) -> StoreResult<Option<StoredExtraction>> {
        let results = read(&self.results);
        Ok(results
            .by_url
            .get(url)
            .and_then(|id| results.by_id.get(id))
            .cloned())
    }

    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<StoredExtraction>> {
        let rows = read(&self.results)
            .by_id
            .values()
            .filter(|r| filter.accepts(r))
            .cloned()
            .collect();
        Ok(Self::page(rows, filter))
    }

    async fn search_results(
        &self,
        query: &str,
        filter: &ResultFilter,
    ) -> StoreResult<Vec<StoredExtraction>> {
        let rows = read(&self.results)
            .by_id
            .values()
            .filter(|r| filter.accepts(r) && r.matches(query))
            .cloned()
            .collect();
        Ok(Self::page(rows, filter))
    }

    async fn save_session(&self, state: &SessionState) -> StoreResult<()> {
        let mut sessions = write(&self.sessions);
        if let Some(existing) = sessions.get(&state.id) {
            if !snapshot_supersedes(existing, state) {
                debug!(session_id = %state.id, "Ignoring stale session snapshot");
                return Ok(());
            }
        }
        sessions.insert(state.id, state.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> StoreResult<Option<SessionState>> {
        Ok(read(&self.sessions).get(&id).cloned())
    }

    async fn list_sessions(
        &self,
        caller_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SessionState>> {
        let mut sessions: Vec<SessionState> = read(&self.sessions)
            .values()
            .filter(|s| caller_id.is_none() || s.caller_id.as_deref() == caller_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn append_logs(&self, entries: &[ProcessingLogEntry]) -> StoreResult<()> {
        write(&self.logs).extend_from_slice(entries);
        Ok(())
    }

    async fn session_logs(&self, session_id: Uuid) -> StoreResult<Vec<ProcessingLogEntry>> {
        Ok(read(&self.logs)
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats {
            total_sessions: read(&self.sessions).len(),
            ..StoreStats::default()
        };
        for stored in read(&self.results).by_id.values() {
            stats.total_results += 1;
            *stats
                .results_by_kind
                .entry(stored.kind.as_str().to_string())
                .or_default() += 1;
        }
        Ok(stats)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
