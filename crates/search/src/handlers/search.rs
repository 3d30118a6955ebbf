//! Search handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use std::time::Instant;
use tracing::instrument;
use validator::Validate;

use crate::engine::ResultSet;
use crate::AppState;
use canto_common::{
    errors::{AppError, Result},
    metrics::{self, RequestMetrics},
};

/// Search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    /// Corpus code, e.g. "MBH"
    #[validate(length(min = 1, max = 32))]
    pub text: String,

    /// Regular expression; may be empty
    pub query: String,
}

/// Run a pattern over one corpus
#[instrument(skip_all, fields(corpus, pattern_len))]
pub async fn search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ResultSet>> {
    let request_metrics = RequestMetrics::start("POST", "/api/search");
    let outcome = match payload {
        Ok(Json(request)) => {
            let span = tracing::Span::current();
            span.record("corpus", request.text.as_str());
            span.record("pattern_len", request.query.len());
            run_search(&state, request).await
        }
        Err(rejection) => Err(rejection.into()),
    };

    let status = match &outcome {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    };
    request_metrics.finish(status);

    outcome.map(Json)
}

async fn run_search(state: &AppState, request: SearchRequest) -> Result<ResultSet> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("text".to_string()),
    })?;

    let max_query_length = state.config.server.max_query_length;
    if request.query.len() > max_query_length {
        return Err(AppError::Validation {
            message: format!("Query exceeds {} bytes", max_query_length),
            field: Some("query".to_string()),
        });
    }

    let corpus = state.corpora.get(&request.text)?;
    let engine = state.engine.clone();
    let pattern = request.query.clone();

    // CPU-bound scan runs on the blocking pool
    let results = tokio::task::spawn_blocking(move || engine.search(&corpus, &pattern))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Search task failed: {}", e),
        })?;

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            metrics::record_invalid_pattern(&request.text);
            return Err(e.into());
        }
    };

    let elapsed = start.elapsed();
    metrics::record_search(elapsed.as_secs_f64(), &request.text, results.len());

    tracing::info!(
        sections = results.len(),
        matches = results.total_matches(),
        latency_ms = elapsed.as_millis() as u64,
        "Search completed"
    );

    Ok(results)
}
