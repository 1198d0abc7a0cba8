//! Background batch execution with operator cancellation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use extraction::error::PipelineResult;
use extraction::{BatchRunner, SessionState};

/// Cancellation tokens of batches still running in this process.
#[derive(Clone, Default)]
pub struct BatchRegistry {
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn running(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the session, then process it on a background task.
    ///
    /// Returns the `pending` snapshot as soon as the session is persisted.
    pub async fn start(
        &self,
        runner: Arc<BatchRunner>,
        urls: Vec<String>,
        caller_id: Option<String>,
    ) -> PipelineResult<SessionState> {
        let tracker = runner.create_session(urls, caller_id).await?;
        let snapshot = tracker.snapshot();
        let session_id = tracker.id();

        let token = CancellationToken::new();
        self.running().insert(session_id, token.clone());

        let registry = self.clone();
        tokio::spawn(async move {
            if let Err(e) = runner.execute(tracker, token).await {
                tracing::error!(session_id = %session_id, error = %e, "Background batch failed");
            }
            registry.running().remove(&session_id);
        });

        Ok(snapshot)
    }

    /// Cancel a running batch. Returns false when it is not running here.
    pub fn cancel(&self, session_id: Uuid) -> bool {
        match self.running().remove(&session_id) {
            Some(token) => {
                tracing::info!(session_id = %session_id, "Cancelling batch");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, session_id: Uuid) -> bool {
        self.running().contains_key(&session_id)
    }

    pub fn running_count(&self) -> usize {
        self.running().len()
    }
}
