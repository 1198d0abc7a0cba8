//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    cancel_session_handler, config_handler, get_result_handler, get_session_detailed_handler,
    get_session_handler, get_session_results_handler, health_handler, list_results_handler,
    list_sessions_handler, scrape_forms_handler, scrape_jobs_handler, search_results_handler,
    stats_handler, test_form_handler, test_job_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Allow any origin when none are configured (development)
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, allowed_origins: &[String]) -> Router {
    let app_state = AxumAppState {
        deps: Arc::new(deps),
    };

    Router::new()
        .route("/api/jobs/scrape", post(scrape_jobs_handler))
        .route("/api/forms/scrape", post(scrape_forms_handler))
        .route("/api/jobs/test", post(test_job_handler))
        .route("/api/forms/test", post(test_form_handler))
        .route("/api/sessions", get(list_sessions_handler))
        .route("/api/sessions/:id", get(get_session_handler))
        .route("/api/sessions/:id/detailed", get(get_session_detailed_handler))
        .route("/api/sessions/:id/results", get(get_session_results_handler))
        .route("/api/sessions/:id/cancel", post(cancel_session_handler))
        .route("/api/results", get(list_results_handler))
        .route("/api/results/search", get(search_results_handler))
        .route("/api/results/:id", get(get_result_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/config", get(config_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
