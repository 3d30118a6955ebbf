//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub corpora: Vec<CorpusStatus>,
}

#[derive(Serialize)]
pub struct CorpusStatus {
    pub code: String,
    pub sections: usize,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - ready once at least one corpus is loaded
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let corpora: Vec<CorpusStatus> = state
        .corpora
        .summary()
        .into_iter()
        .map(|(code, sections)| CorpusStatus { code, sections })
        .collect();

    Json(ReadyResponse {
        status: if corpora.is_empty() { "not_ready" } else { "ready" }.to_string(),
        corpora,
    })
}
