//! End-to-end router tests.
//!
//! Drive the full Axum router with `tower::ServiceExt::oneshot`, the stub
//! embedder, and the in-memory store, covering auth, ingestion hand-off and
//! job polling, and ranked search.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use semqa::config::AppConfig;
use semqa::embedding::StubEmbedder;
use semqa::ingest::IngestPipeline;
use semqa::jobs::JobQueue;
use semqa::search::SearchService;
use semqa::server::{build_router, AppState};
use semqa::store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const DIM: usize = 32;
const USER: &str = "tester";
const PASSWORD: &str = "hunter2";

fn test_router() -> Router {
    let mut config = AppConfig::default();
    config.server.auth_username = USER.to_string();
    config.server.auth_password = PASSWORD.to_string();
    config.server.metrics_enabled = false;
    config.embedding.dimension = DIM;

    let embedder = Arc::new(StubEmbedder::new(DIM));
    let store = Arc::new(MemoryStore::new(DIM));
    let pipeline = Arc::new(IngestPipeline::new(embedder.clone(), store.clone()));
    let jobs = JobQueue::start(pipeline, 16, 2);
    let search = SearchService::new(embedder, store);

    build_router(AppState::new(config, jobs, search, None))
}

fn auth_header() -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{USER}:{PASSWORD}"));
    format!("Basic {encoded}")
}

fn authed_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, auth_header())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, auth_header())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll a job until it reaches a terminal state.
async fn wait_for_job(router: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let response = router
            .clone()
            .oneshot(authed_get(&format!("/api/v1/jobs/{job_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let state = body["state"].as_str().unwrap().to_string();
        if state == "succeeded" || state == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never finished");
}

#[tokio::test]
async fn health_is_public() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_credentials() {
    let router = test_router();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"question": "anything"}).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let router = test_router();
    let bad = base64::engine::general_purpose::STANDARD.encode(format!("{USER}:wrong"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/search")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Basic {bad}"))
        .body(Body::from(json!({"question": "anything"}).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ingest_missing_answer_column_is_client_error() {
    let router = test_router();
    let response = router
        .oneshot(authed_post(
            "/api/v1/ingest",
            json!({"rows": [{"question": "What is X?"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn ingest_returns_accepted_with_job_id() {
    let router = test_router();
    let response = router
        .oneshot(authed_post(
            "/api/v1/ingest",
            json!({"rows": [
                {"question": "capital of France", "answer": "Paris"},
                {"question": "capital of Spain", "answer": "Madrid"},
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["rows"], 2);
    assert!(body["job_id"].as_str().is_some());
}

#[tokio::test]
async fn ingest_then_search_returns_ranked_results() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(authed_post(
            "/api/v1/ingest",
            json!({"rows": [
                {"question": "capital of France", "answer": "Paris"},
                {"question": "capital of Spain", "answer": "Madrid"},
            ]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted = body_json(response).await;
    let job_id = accepted["job_id"].as_str().unwrap().to_string();

    let job = wait_for_job(&router, &job_id).await;
    assert_eq!(job["state"], "succeeded");
    assert_eq!(job["inserted"], 2);

    // The stub embedder maps identical text to identical vectors, so the
    // stored concatenation is the distance-zero top hit.
    let response = router
        .clone()
        .oneshot(authed_post(
            "/api/v1/search",
            json!({"question": "capital of France Paris", "limit": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["answer"], "Paris");

    // Distances are non-decreasing for a wider query.
    let response = router
        .oneshot(authed_post(
            "/api/v1/search",
            json!({"question": "capital of France Paris", "limit": 5}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    let d0 = results[0]["distance"].as_f64().unwrap();
    let d1 = results[1]["distance"].as_f64().unwrap();
    assert!(d0 <= d1);
}

#[tokio::test]
async fn offset_is_accepted_as_limit_alias() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(authed_post(
            "/api/v1/ingest",
            json!({"rows": [
                {"question": "q1", "answer": "a1"},
                {"question": "q2", "answer": "a2"},
                {"question": "q3", "answer": "a3"},
            ]}),
        ))
        .await
        .unwrap();
    let accepted = body_json(response).await;
    wait_for_job(&router, accepted["job_id"].as_str().unwrap()).await;

    let response = router
        .oneshot(authed_post(
            "/api/v1/search",
            json!({"question": "q1 a1", "offset": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_question_is_client_error() {
    let router = test_router();
    let response = router
        .oneshot(authed_post("/api/v1/search", json!({"question": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_on_empty_store_is_not_found() {
    let router = test_router();
    let response = router
        .oneshot(authed_post(
            "/api/v1/search",
            json!({"question": "anything at all"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let router = test_router();
    let response = router
        .oneshot(authed_get(
            "/api/v1/jobs/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
