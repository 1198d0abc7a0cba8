//! Test harness for driving the HTTP router in-process.
//!
//! Every external service is mocked: pages come from a `MockFetcher`,
//! completions from a `MockModel`, and results land in a `MemoryStore`.
//! Requests go through `tower::ServiceExt::oneshot`, so no port is bound.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use extraction::testing::{MockFetcher, MockModel};
use extraction::MemoryStore;
use server_core::config::PipelineSettings;
use server_core::kernel::ServerDeps;
use server_core::server::build_app;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub fetcher: MockFetcher,
    pub model: Arc<MockModel>,
}

impl TestApp {
    pub fn new(fetcher: MockFetcher, model: MockModel) -> Self {
        Self::with_settings(fetcher, model, PipelineSettings::default())
    }

    pub fn with_settings(fetcher: MockFetcher, model: MockModel, settings: PipelineSettings) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Arc::new(MemoryStore::new());
        let model = Arc::new(model);
        let deps = ServerDeps::new(
            Arc::new(fetcher.clone()),
            model.clone(),
            store.clone(),
            settings,
        )
        .expect("Failed to build server deps");

        Self {
            router: build_app(deps, &[]),
            store,
            fetcher,
            model,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response was not JSON")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("Invalid request");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Invalid request");
        self.send(request).await
    }

    /// Poll a session until it reaches a terminal status.
    pub async fn wait_for_session(&self, id: &str) -> Value {
        let uri = format!("/api/sessions/{}", id);
        for _ in 0..200 {
            let (status, body) = self.get(&uri).await;
            assert_eq!(status, StatusCode::OK, "session lookup failed: {}", body);
            let terminal = matches!(body["status"].as_str(), Some("completed") | Some("failed"));
            if terminal && body["running"] == Value::Bool(false) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Session {} did not finish", id);
    }
}
