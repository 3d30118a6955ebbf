//! End-to-end tests through the HTTP router

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use canto_common::{AppConfig, Corpus, CorpusRegistry};
use canto_search::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let mut corpora = CorpusRegistry::new();
    corpora.insert(
        "MBH",
        Corpus::from_json_str(
            r#"{
                "1:1": "dharmakshetre kurukshetre samaveta yuyutsavah",
                "1:2": "mamakah pandavashchaiva",
                "1:3": "kim akurvata sanjaya"
            }"#,
        )
        .unwrap(),
    );
    create_router(AppState::new(AppConfig::default(), corpora))
}

async fn post_search(body: Value) -> (StatusCode, Value) {
    post_raw(body.to_string()).await
}

async fn post_raw(body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn search_returns_object_keyed_by_section() {
    let (status, body) = post_search(json!({ "text": "MBH", "query": "kuru" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "1:1": {
                "start": 14,
                "surrounding": "...dharmakshetre <mark>kuru</mark>kshetre samaveta yuyutsavah..."
            }
        })
    );
}

#[tokio::test]
async fn search_reports_every_matching_section() {
    let (status, body) = post_search(json!({ "text": "MBH", "query": "a" })).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"1:1".to_string()));
}

#[tokio::test]
async fn invalid_pattern_is_bad_request() {
    let (status, body) = post_search(json!({ "text": "MBH", "query": "(abc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PATTERN");
    assert_eq!(body["error"]["details"]["pattern"], "(abc");
}

#[tokio::test]
async fn unknown_corpus_is_not_found() {
    let (status, body) = post_search(json!({ "text": "RMY", "query": "rama" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CORPUS_NOT_FOUND");
}

#[tokio::test]
async fn missing_query_field_is_structured_validation_error() {
    let (status, body) = post_search(json!({ "text": "MBH" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn malformed_body_is_structured_validation_error() {
    let (status, body) = post_raw("{\"text\": \"MBH\",".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn no_matches_is_empty_object() {
    let (status, body) = post_search(json!({ "text": "MBH", "query": "zzz" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/search")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn responses_carry_request_id() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
