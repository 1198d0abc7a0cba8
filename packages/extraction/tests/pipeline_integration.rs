//! Integration tests for the batch pipeline.
//!
//! These drive a `BatchRunner` end to end with mock collaborators:
//! 1. Fetch pages (or fail to)
//! 2. Classify them
//! 3. Extract and score the good ones
//! 4. Persist results, logs, and session snapshots

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use extraction::error::StoreResult;
use extraction::testing::{fixtures, MockFetchFailure, MockFetcher, MockModel};
use extraction::{
    BatchRunner, ExtractionKind, ExtractionSchema, FailureKind, FieldSpec, FieldType,
    LogStage, MemoryStore, OutcomeStatus, PipelineConfig, ProcessingLogEntry, ResultFilter,
    ResultStore, SessionState, SessionStatus, StorageError, StoreStats, StoredExtraction,
    VerdictKind, CANCELLED_REASON,
};

/// Helper to build a job runner over shared mocks.
fn job_runner(
    fetcher: &MockFetcher,
    model: &Arc<MockModel>,
    store: Arc<dyn ResultStore>,
    config: PipelineConfig,
) -> BatchRunner {
    BatchRunner::new(
        Arc::new(fetcher.clone()),
        model.clone(),
        store,
        &config,
        ExtractionSchema::job_posting(),
    )
    .unwrap()
}

fn outcome_for<'a>(state: &'a SessionState, url: &str) -> &'a extraction::UrlOutcome {
    state.outcomes.iter().find(|o| o.url == url).unwrap()
}

/// 600 characters with exactly three job indicators.
fn three_keyword_page() -> String {
    let mut text = String::from(
        "Responsibilities: build things. Requirements: care about users. Benefits: lunch. ",
    );
    while text.chars().count() < 600 {
        text.push_str("Our team builds tools for neighbors. ");
    }
    text.chars().take(600).collect()
}

#[tokio::test]
async fn test_empty_content_never_reaches_the_model() {
    let url = "https://example.com/blank";
    let fetcher = MockFetcher::new().with_text(url, "");
    let model = Arc::new(MockModel::new());
    let store = Arc::new(MemoryStore::new());
    let runner = job_runner(&fetcher, &model, store.clone(), PipelineConfig::for_kind(ExtractionKind::JobPosting));

    let state = runner.run(vec![url.to_string()], None).await.unwrap();

    assert_eq!(model.call_count(), 0);
    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.skipped_urls, 1);
    assert_eq!(state.verdicts.invalid, 1);
    assert_eq!(outcome_for(&state, url).verdict, Some(VerdictKind::Invalid));
    assert_eq!(store.result_count(), 0);
}

#[tokio::test]
async fn test_preview_scores_without_storing() {
    let url = "https://example.com/jobs/cook";
    let blank = "https://example.com/blank";
    let fetcher = MockFetcher::new()
        .with_text(url, fixtures::job_posting_page("Line Cook", "Diner"))
        .with_text(blank, "");
    let model = Arc::new(
        MockModel::new().with_response(url, fixtures::complete_job_response("Line Cook", "Diner", 0.5)),
    );
    let store = Arc::new(MemoryStore::new());
    let runner = job_runner(&fetcher, &model, store.clone(), PipelineConfig::for_kind(ExtractionKind::JobPosting));

    let preview = runner.preview(url).await;
    assert_eq!(preview.status, OutcomeStatus::Succeeded);
    assert_eq!(preview.kind, ExtractionKind::JobPosting);
    assert!(preview.verdict.is_some());
    assert_eq!(preview.result.as_ref().and_then(|r| r.title.as_deref()), Some("Line Cook"));
    assert!(preview.confidence.is_some());
    assert!(preview.logs.iter().all(|l| l.session_id == Uuid::nil()));

    let skipped = runner.preview(blank).await;
    assert_eq!(skipped.status, OutcomeStatus::Skipped);
    assert_eq!(skipped.verdict.map(|v| v.kind), Some(VerdictKind::Invalid));
    assert!(skipped.result.is_none());

    assert_eq!(model.call_count(), 1);
    assert_eq!(store.result_count(), 0);
    assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn test_partial_extraction_blends_confidence() {
    let url = "https://example.com/jobs/engineer";
    let schema = ExtractionSchema::new(
        ExtractionKind::JobPosting,
        vec![
            FieldSpec::new("title", FieldType::Text, "Job title").scoring(),
            FieldSpec::new("company", FieldType::Text, "Company").scoring(),
            FieldSpec::new("location", FieldType::Text, "Location"),
        ],
        "/confidence",
    )
    .unwrap();

    let fetcher = MockFetcher::new().with_text(url, three_keyword_page());
    let model = Arc::new(MockModel::new().with_response(
        url,
        r#"{"title": "Engineer", "company": null, "location": null, "confidence": 0.9}"#,
    ));
    let store = Arc::new(MemoryStore::new());
    let runner = BatchRunner::new(
        Arc::new(fetcher),
        model.clone(),
        store.clone(),
        &PipelineConfig::for_kind(ExtractionKind::JobPosting),
        schema,
    )
    .unwrap();

    let state = runner.run(vec![url.to_string()], None).await.unwrap();

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.successful_urls, 1);
    assert_eq!(model.call_count(), 1);

    let stored = store.get_result_by_url(url).await.unwrap().unwrap();
    assert_eq!(stored.verdict.kind, VerdictKind::Good);
    assert_eq!(stored.title.as_deref(), Some("Engineer"));
    assert!((stored.confidence.ai_confidence - 0.9).abs() < 1e-9);
    assert!((stored.confidence.validation_confidence - 0.5).abs() < 1e-9);
    assert!((stored.confidence.final_confidence - 0.66).abs() < 1e-9);
    assert_eq!(stored.confidence.bonus_applied, 0.0);
}

#[tokio::test]
async fn test_mixed_batch_completes_with_every_bucket() {
    let gone = "https://jobs.lever.co/acme/gone";
    let good = "https://boards.greenhouse.io/acme/jobs/1";
    let down = "https://careers.down.example/jobs/2";

    let fetcher = MockFetcher::new()
        .with_failure(gone, MockFetchFailure::NotFound(404))
        .with_text(good, fixtures::job_posting_page("Backend Engineer", "Acme"))
        .with_failure(down, MockFetchFailure::Status(500));
    let model = Arc::new(
        MockModel::new().with_response(good, fixtures::complete_job_response("Backend Engineer", "Acme", 0.8)),
    );
    let store = Arc::new(MemoryStore::new());
    let runner = job_runner(&fetcher, &model, store.clone(), PipelineConfig::for_kind(ExtractionKind::JobPosting));

    let state = runner
        .run(vec![gone.into(), good.into(), down.into()], Some("caller-1".into()))
        .await
        .unwrap();

    assert_eq!(state.processed_urls, 3);
    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.successful_urls, 1);
    assert_eq!(state.skipped_urls, 1);
    assert_eq!(state.failed_urls, 1);
    assert_eq!(state.verdicts.not_found, 1);
    assert_eq!(state.verdicts.good, 1);
    assert_eq!(state.verdicts.unclassified, 1);
    assert_eq!(state.progress_percentage, 100.0);
    assert!(state.summary.contains("1 not_found"), "{}", state.summary);
    assert!(state.summary.contains("1 succeeded"), "{}", state.summary);
    assert!(state.summary.contains("1 failed"), "{}", state.summary);

    assert_eq!(outcome_for(&state, gone).verdict, Some(VerdictKind::NotFound));
    assert_eq!(outcome_for(&state, down).failure, Some(FailureKind::Fetch));

    // Only the good page cost a model call
    assert_eq!(model.call_count(), 1);

    let stored = store.get_result_by_url(good).await.unwrap().unwrap();
    assert_eq!(stored.session_id, Some(state.id));
    assert!(stored.confidence.bonus_applied > 0.0);
    assert_eq!(outcome_for(&state, good).result_id, Some(stored.id));

    let persisted = store.get_session(state.id).await.unwrap().unwrap();
    assert_eq!(persisted, state);

    let logs = store.session_logs(state.id).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.url == good && l.stage == LogStage::Completed));
    assert!(logs
        .iter()
        .any(|l| l.url == good && l.stage == LogStage::Fetch && l.message.contains("greenhouse")));
}

#[tokio::test]
async fn test_batch_with_every_url_unreachable_fails() {
    let fetcher = MockFetcher::new()
        .with_failure("https://a.example", MockFetchFailure::Unreachable)
        .with_failure("https://b.example", MockFetchFailure::Timeout);
    let model = Arc::new(MockModel::new());
    let runner = job_runner(
        &fetcher,
        &model,
        Arc::new(MemoryStore::new()),
        PipelineConfig::for_kind(ExtractionKind::JobPosting),
    );

    let state = runner
        .run(vec!["https://a.example".into(), "https://b.example".into()], None)
        .await
        .unwrap();

    assert_eq!(state.status, SessionStatus::Failed);
    assert_eq!(state.processed_urls, 2);
    assert_eq!(state.failed_urls, 2);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn test_model_failures_and_bad_json_are_per_url() {
    let broken = "https://example.com/jobs/broken";
    let garbled = "https://example.com/jobs/garbled";
    let fine = "https://example.com/jobs/fine";

    let fetcher = MockFetcher::new()
        .with_text(broken, fixtures::job_posting_page("Cook", "Diner"))
        .with_text(garbled, fixtures::job_posting_page("Baker", "Bakery"))
        .with_text(fine, fixtures::job_posting_page("Server", "Cafe"));
    let model = Arc::new(
        MockModel::new()
            .with_error(broken, extraction::ModelError::Timeout)
            .with_response(garbled, "I could not find a job here.")
            .with_response(fine, fixtures::partial_job_response("Server", "Cafe", 0.7)),
    );
    let runner = job_runner(
        &fetcher,
        &model,
        Arc::new(MemoryStore::new()),
        PipelineConfig::for_kind(ExtractionKind::JobPosting),
    );

    let state = runner
        .run(vec![broken.into(), garbled.into(), fine.into()], None)
        .await
        .unwrap();

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.failed_urls, 2);
    assert_eq!(state.successful_urls, 1);
    assert_eq!(outcome_for(&state, broken).failure, Some(FailureKind::Extraction));
    assert_eq!(outcome_for(&state, garbled).failure, Some(FailureKind::Extraction));
    assert_eq!(outcome_for(&state, broken).verdict, Some(VerdictKind::Good));
}

#[tokio::test]
async fn test_poor_content_is_skipped_unless_allowed() {
    let url = "https://example.com/jobs/thin";
    let mut thin = String::from("Experience welcome. ");
    while thin.chars().count() < 700 {
        thin.push_str("A friendly neighborhood place to spend the afternoon. ");
    }
    let fetcher = MockFetcher::new().with_text(url, thin);
    let model = Arc::new(MockModel::new().with_default_response(fixtures::partial_job_response("Host", "Cafe", 0.4)));

    let strict = job_runner(
        &fetcher,
        &model,
        Arc::new(MemoryStore::new()),
        PipelineConfig::for_kind(ExtractionKind::JobPosting),
    );
    let state = strict.run(vec![url.into()], None).await.unwrap();
    assert_eq!(state.skipped_urls, 1);
    assert_eq!(state.verdicts.poor, 1);
    assert_eq!(model.call_count(), 0);

    let mut config = PipelineConfig::for_kind(ExtractionKind::JobPosting);
    config.extraction = config.extraction.with_allow_poor(true);
    let lenient = job_runner(&fetcher, &model, Arc::new(MemoryStore::new()), config);
    let state = lenient.run(vec![url.into()], None).await.unwrap();
    assert_eq!(state.successful_urls, 1);
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_worker_pool_is_bounded() {
    let urls: Vec<String> = (0..10).map(|i| format!("https://example.com/jobs/{}", i)).collect();
    let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(20));
    for url in &urls {
        fetcher = fetcher.with_text(url.clone(), fixtures::job_posting_page("Engineer", "Acme"));
    }
    let model = Arc::new(MockModel::new().with_default_response(fixtures::partial_job_response("Engineer", "Acme", 0.6)));

    let mut config = PipelineConfig::for_kind(ExtractionKind::JobPosting);
    config.batch = config.batch.with_concurrency(3);
    let runner = job_runner(&fetcher, &model, Arc::new(MemoryStore::new()), config);

    let state = runner.run(urls, None).await.unwrap();

    assert_eq!(state.processed_urls, 10);
    assert_eq!(state.successful_urls, 10);
    assert!(fetcher.max_in_flight() <= 3, "saw {}", fetcher.max_in_flight());
    assert!(fetcher.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_duplicate_urls_are_processed_once() {
    let url = "https://example.com/jobs/1";
    let fetcher = MockFetcher::new().with_text(url, fixtures::job_posting_page("Engineer", "Acme"));
    let model = Arc::new(MockModel::new());
    let runner = job_runner(
        &fetcher,
        &model,
        Arc::new(MemoryStore::new()),
        PipelineConfig::for_kind(ExtractionKind::JobPosting),
    );

    let state = runner
        .run(vec![url.into(), format!(" {} ", url), url.into()], None)
        .await
        .unwrap();

    assert_eq!(state.total_urls, 1);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_oversized_and_empty_batches_are_rejected() {
    let fetcher = MockFetcher::new();
    let model = Arc::new(MockModel::new());
    let store = Arc::new(MemoryStore::new());
    let runner = job_runner(&fetcher, &model, store.clone(), PipelineConfig::for_kind(ExtractionKind::JobPosting));

    let too_many: Vec<String> = (0..51).map(|i| format!("https://example.com/{}", i)).collect();
    assert!(runner.run(too_many, None).await.is_err());
    assert!(runner.run(vec![], None).await.is_err());
    assert_eq!(store.session_count(), 0);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_cancelled_batch_fails_without_recording() {
    let urls: Vec<String> = (0..5).map(|i| format!("https://example.com/jobs/{}", i)).collect();
    let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(50));
    for url in &urls {
        fetcher = fetcher.with_text(url.clone(), fixtures::job_posting_page("Engineer", "Acme"));
    }
    let model = Arc::new(MockModel::new());
    let mut config = PipelineConfig::for_kind(ExtractionKind::JobPosting);
    config.batch = config.batch.with_concurrency(1);
    let store = Arc::new(MemoryStore::new());
    let runner = job_runner(&fetcher, &model, store.clone(), config);

    let tracker = runner.create_session(urls, None).await.unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        trigger.cancel();
    });

    let state = runner.execute(tracker, cancel).await.unwrap();

    assert_eq!(state.status, SessionStatus::Failed);
    assert_eq!(state.error.as_deref(), Some(CANCELLED_REASON));
    assert!(state.processed_urls < 5);

    let persisted = store.get_session(state.id).await.unwrap().unwrap();
    assert_eq!(persisted.status, SessionStatus::Failed);
}

#[tokio::test]
async fn test_spawned_batch_is_observable_through_the_store() {
    let url = "https://docs.google.com/forms/d/e/1FAIpQLSf_example/viewform";
    let fetcher = MockFetcher::new().with_text(url, fixtures::form_page("Volunteer Signup"));
    let model = Arc::new(MockModel::new().with_default_response(
        serde_json::json!({
            "form_metadata": {"title": "Volunteer Signup"},
            "questions": [{"question_text": "Your name", "question_type": "short_answer"}],
            "extraction_confidence": {"overall_confidence": 0.85},
        })
        .to_string(),
    ));
    let store = Arc::new(MemoryStore::new());
    let runner = Arc::new(
        BatchRunner::new(
            Arc::new(fetcher),
            model,
            store.clone(),
            &PipelineConfig::for_kind(ExtractionKind::GoogleForm),
            ExtractionSchema::google_form(),
        )
        .unwrap(),
    );

    let pending = runner
        .spawn(vec![url.into()], Some("volunteer-desk".into()), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pending.status, SessionStatus::Pending);

    let mut state = store.get_session(pending.id).await.unwrap().unwrap();
    for _ in 0..100 {
        if state.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        state = store.get_session(pending.id).await.unwrap().unwrap();
    }

    assert_eq!(state.status, SessionStatus::Completed);
    assert_eq!(state.successful_urls, 1);

    let forms = store
        .list_results(&ResultFilter::new().with_kind(ExtractionKind::GoogleForm))
        .await
        .unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].title.as_deref(), Some("Volunteer Signup"));
    assert_eq!(forms[0].confidence.validation_confidence, 1.0);
}

/// Store whose result writes always fail.
struct FailingUpserts(MemoryStore);

#[async_trait]
impl ResultStore for FailingUpserts {
    async fn upsert_result(&self, _stored: &StoredExtraction) -> StoreResult<Uuid> {
        Err(StorageError::backend(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    async fn get_result(&self, id: Uuid) -> StoreResult<Option<StoredExtraction>> {
        self.0.get_result(id).await
    }

    async fn get_result_by_url(&self, url: &str) -> StoreResult<Option<StoredExtraction>> {
        self.0.get_result_by_url(url).await
    }

    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<StoredExtraction>> {
        self.0.list_results(filter).await
    }

    async fn search_results(
        &self,
        query: &str,
        filter: &ResultFilter,
    ) -> StoreResult<Vec<StoredExtraction>> {
        self.0.search_results(query, filter).await
    }

    async fn save_session(&self, state: &SessionState) -> StoreResult<()> {
        self.0.save_session(state).await
    }

    async fn get_session(&self, id: Uuid) -> StoreResult<Option<SessionState>> {
        self.0.get_session(id).await
    }

    async fn list_sessions(
        &self,
        caller_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SessionState>> {
        self.0.list_sessions(caller_id, limit).await
    }

    async fn append_logs(&self, entries: &[ProcessingLogEntry]) -> StoreResult<()> {
        self.0.append_logs(entries).await
    }

    async fn session_logs(&self, session_id: Uuid) -> StoreResult<Vec<ProcessingLogEntry>> {
        self.0.session_logs(session_id).await
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        self.0.stats().await
    }

    fn name(&self) -> &str {
        "failing-upserts"
    }
}

#[tokio::test]
async fn test_storage_failure_marks_url_failed() {
    let url = "https://example.com/jobs/1";
    let fetcher = MockFetcher::new().with_text(url, fixtures::job_posting_page("Engineer", "Acme"));
    let model = Arc::new(MockModel::new());
    let store = Arc::new(FailingUpserts(MemoryStore::new()));
    let runner = job_runner(&fetcher, &model, store.clone(), PipelineConfig::for_kind(ExtractionKind::JobPosting));

    let state = runner.run(vec![url.into()], None).await.unwrap();

    assert_eq!(state.status, SessionStatus::Completed);
    let outcome = outcome_for(&state, url);
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.failure, Some(FailureKind::Storage));
    assert!(outcome.message.as_deref().unwrap_or("").contains("disk full"));
}
