//! PostgreSQL store tests against a throwaway container.
//!
//! Run with: cargo test -p server --test postgres_store_tests -- --ignored

use std::sync::Arc;

use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use extraction::testing::{fixtures, MockFetchFailure, MockFetcher, MockModel};
use extraction::{
    BatchRunner, ExtractionKind, PipelineConfig, PostgresStore, ResultFilter, ResultStore,
    SessionStatus,
};

struct SharedPostgres {
    db_url: String,
    _container: ContainerAsync<Postgres>,
}

static SHARED: OnceCell<SharedPostgres> = OnceCell::const_new();

async fn store() -> Arc<PostgresStore> {
    let shared = SHARED
        .get_or_init(|| async {
            let container = Postgres::default()
                .with_tag("16")
                .start()
                .await
                .expect("Failed to start Postgres container");
            let host = container.get_host().await.expect("host");
            let port = container.get_host_port_ipv4(5432).await.expect("port");
            SharedPostgres {
                db_url: format!("postgresql://postgres:postgres@{}:{}/postgres", host, port),
                _container: container,
            }
        })
        .await;

    Arc::new(
        PostgresStore::new(&shared.db_url)
            .await
            .expect("Failed to open store"),
    )
}

fn runner(fetcher: MockFetcher, model: MockModel, store: Arc<PostgresStore>) -> BatchRunner {
    BatchRunner::new(
        Arc::new(fetcher),
        Arc::new(model),
        store,
        &PipelineConfig::default(),
        ExtractionKind::JobPosting.schema(),
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn batch_results_round_trip_through_postgres() {
    let store = store().await;
    let url = format!("https://jobs.lever.co/acme/{}", uuid::Uuid::new_v4());
    let gone = format!("https://example.com/{}", uuid::Uuid::new_v4());
    let fetcher = MockFetcher::new()
        .with_text(&url, fixtures::job_posting_page("Data Engineer", "Acme"))
        .with_failure(&gone, MockFetchFailure::NotFound(404));
    let model = MockModel::new().with_response(
        &url,
        fixtures::complete_job_response("Data Engineer", "Acme", 0.8),
    );

    let state = runner(fetcher, model, store.clone())
        .run(vec![url.clone(), gone.clone()], Some("pg-user".into()))
        .await
        .unwrap();
    assert_eq!(state.status, SessionStatus::Completed);

    let stored = store.get_session(state.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.processed_urls, 2);
    assert_eq!(stored.outcomes.len(), 2);

    let result = store.get_result_by_url(&url).await.unwrap().unwrap();
    assert_eq!(result.title.as_deref(), Some("Data Engineer"));
    assert_eq!(result.session_id, Some(state.id));
    assert_eq!(store.get_result(result.id).await.unwrap().unwrap().url, url);

    let logs = store.session_logs(state.id).await.unwrap();
    assert!(logs.iter().any(|l| l.url == gone));

    let sessions = store.list_sessions(Some("pg-user"), 10).await.unwrap();
    assert!(sessions.iter().any(|s| s.id == state.id));

    let scoped = store
        .list_results(&ResultFilter::new().with_session(state.id))
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].url, url);

    let stats = store.stats().await.unwrap();
    assert!(stats.total_results >= 1);
    assert!(stats.total_sessions >= 1);
    assert!(stats.results_by_kind.get("job_posting").copied().unwrap_or(0) >= 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn upsert_keeps_id_and_search_escapes_wildcards() {
    let store = store().await;
    let url = format!("https://boards.greenhouse.io/acme/{}", uuid::Uuid::new_v4());
    let page = fixtures::job_posting_page("100% Remote Engineer", "Acme");
    let fetcher = MockFetcher::new().with_text(&url, page);
    let model = MockModel::new().with_response(
        &url,
        fixtures::complete_job_response("100% Remote Engineer", "Acme", 0.7),
    );
    let runner = runner(fetcher, model, store.clone());

    runner.run(vec![url.clone()], None).await.unwrap();
    let first = store.get_result_by_url(&url).await.unwrap().unwrap();
    runner.run(vec![url.clone()], None).await.unwrap();
    let second = store.get_result_by_url(&url).await.unwrap().unwrap();
    assert_eq!(first.id, second.id);

    let filter = ResultFilter::new().with_kind(ExtractionKind::JobPosting);
    let hits = store.search_results("100% remote", &filter).await.unwrap();
    assert!(hits.iter().any(|r| r.url == url));

    let none = store.search_results("100%x", &filter).await.unwrap();
    assert!(none.iter().all(|r| r.url != url));

    store.ping().await.unwrap();
}
