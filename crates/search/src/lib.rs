//! Canto Search Service
//!
//! Regex search over named text sections:
//! - Pattern compilation with multi-line and dot-all semantics
//! - Capped scan across a corpus in section order
//! - Highlighted snippets with clamped context windows
//! - HTTP API for corpus selection and querying

pub mod engine;
pub mod handlers;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use canto_common::{AppConfig, CorpusRegistry};
use engine::QueryEngine;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub corpora: Arc<CorpusRegistry>,
    pub engine: Arc<QueryEngine>,
}

impl AppState {
    pub fn new(config: AppConfig, corpora: CorpusRegistry) -> Self {
        let engine = QueryEngine::from_config(&config.search);
        Self {
            config: Arc::new(config),
            corpora: Arc::new(corpora),
            engine: Arc::new(engine),
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // The search UI is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.request_timeout());
    let concurrency = ConcurrencyLimitLayer::new(state.config.server.max_concurrent_requests);

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Search endpoint
        .route("/api/search", post(handlers::search::search))

        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(concurrency)
        .layer(cors)
        // Propagation must sit inside the layer that assigns the id
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
