//! Integration tests for the gateway API.
//!
//! These tests spin up a real listener backed by the in-memory store and make
//! HTTP requests to verify the complete request/response cycle.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use common::{StallingBackend, TestServer};
use redis_rest_gateway::config::GeneratorConfig;
use redis_rest_gateway::service::{Counter, IdGenerator, ManualClock};
use redis_rest_gateway::storage::{BackendCall, MemoryBackend};

#[derive(Debug, Deserialize)]
struct Record {
    uid: u64,
    key: String,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: i32,
    #[allow(dead_code)]
    message: String,
}

async fn server() -> (TestServer, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let server = TestServer::start(backend.clone()).await;
    (server, backend)
}

// ============================================================================
// Banner, Health and Metrics
// ============================================================================

#[tokio::test]
async fn test_index_banner() {
    let (server, backend) = server().await;

    let response = server.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let text = response.text().await.unwrap();
    assert_eq!(text, format!("Redis REST Gateway v{}\n", env!("CARGO_PKG_VERSION")));
    assert_eq!(server.metrics.get(Counter::Index), 1);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_health_and_ready() {
    let (server, backend) = server().await;

    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    backend.set_unavailable(true);
    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (server, _backend) = server().await;

    server
        .post("/create", &json!({"key": "m", "value": "1"}))
        .await;
    server.post("/read", &json!({"key": ""})).await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let text = response.text().await.unwrap();
    assert!(text.contains("gateway_requests_total{operation=\"create\"} 1"));
    assert!(text.contains("gateway_requests_total{operation=\"read\"} 0"));
    assert!(text.contains("gateway_errors_total 1"));
}

// ============================================================================
// CRUD Round Trip
// ============================================================================

#[tokio::test]
async fn test_create_returns_uid_and_echo() {
    let (server, _backend) = server().await;

    let response = server
        .post("/create", &json!({"key": "k", "value": "v"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body: Record = response.json().await.unwrap();
    assert_ne!(body.uid, 0);
    assert_eq!(body.key, "k");
    assert_eq!(body.value.as_deref(), Some("v"));
    assert_eq!(server.metrics.get(Counter::Create), 1);
}

#[tokio::test]
async fn test_successive_uids_are_distinct() {
    let (server, _backend) = server().await;

    let mut uids = HashSet::new();
    for i in 0..20 {
        let body: Record = server
            .post("/create", &json!({"key": format!("k{i}"), "value": "v"}))
            .await
            .json()
            .await
            .unwrap();
        assert_ne!(body.uid, 0);
        assert!(uids.insert(body.uid));
    }
}

#[tokio::test]
async fn test_create_read_update_delete_cycle() {
    let (server, _backend) = server().await;

    let response = server
        .post("/create", &json!({"key": "k", "value": "v"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Record = server
        .post("/read", &json!({"key": "k"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body.value.as_deref(), Some("v"));

    let response = server
        .post("/update", &json!({"key": "k", "value": "v2"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Record = response.json().await.unwrap();
    assert_eq!(body.value.as_deref(), Some("v2"));

    let body: Record = server
        .post("/read", &json!({"key": "k"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body.value.as_deref(), Some("v2"));

    let response = server.post("/delete", &json!({"key": "k"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Record = response.json().await.unwrap();
    assert_eq!(body.key, "k");
    assert!(body.value.is_none());

    let response = server.post("/read", &json!({"key": "k"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error.code, 4001);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.create, 1);
    assert_eq!(snapshot.read, 2);
    assert_eq!(snapshot.update, 1);
    assert_eq!(snapshot.delete, 1);
    assert_eq!(snapshot.errors, 1);
}

#[tokio::test]
async fn test_empty_value_is_legal() {
    let (server, backend) = server().await;

    let response = server
        .post("/create", &json!({"key": "blank", "value": ""}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Record = server
        .post("/read", &json!({"key": "blank"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body.value.as_deref(), Some(""));
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn test_delete_missing_key_counts_warning() {
    let (server, _backend) = server().await;

    let response = server.post("/delete", &json!({"key": "ghost"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.delete, 1);
    assert_eq!(snapshot.warnings, 1);
    assert_eq!(snapshot.errors, 0);
}

// ============================================================================
// Input Validation
// ============================================================================

#[tokio::test]
async fn test_empty_key_never_reaches_backend() {
    let (server, backend) = server().await;

    for (path, body) in [
        ("/create", json!({"key": "", "value": "v"})),
        ("/read", json!({"key": ""})),
        ("/update", json!({"key": "", "value": "v"})),
        ("/delete", json!({"key": ""})),
        ("/read", json!({})),
    ] {
        let response = server.post(path, &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.error.code, 3002);
    }

    assert_eq!(backend.command_count(), 0);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.errors, 5);
    assert_eq!(snapshot.create + snapshot.read + snapshot.update + snapshot.delete, 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (server, backend) = server().await;

    let response = server.post_raw("/create", "{\"key\": \"k\", ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error.code, 3001);

    // Missing value on a write is a decode failure, not a missing key.
    let response = server.post("/update", &json!({"key": "k"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(backend.command_count(), 0);
    assert_eq!(server.metrics.get(Counter::Errors), 2);
}

#[tokio::test]
async fn test_wrong_method_rejected_without_error_count() {
    let (server, backend) = server().await;

    for path in ["/create", "/read", "/update", "/delete"] {
        let response = server.get(path).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{path}");
    }

    let response = server
        .client
        .put(server.url("/create"))
        .json(&json!({"key": "k", "value": "v"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = server.client.post(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.errors, 0);
    assert_eq!(snapshot.rejected, 6);
    assert_eq!(snapshot.index, 0);
    assert!(backend.calls().is_empty());
}

// ============================================================================
// Backend Failures
// ============================================================================

#[tokio::test]
async fn test_backend_unavailable() {
    let (server, backend) = server().await;
    backend.set_unavailable(true);

    let response = server
        .post("/create", &json!({"key": "k", "value": "v"}))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error.code, 5003);

    assert_eq!(
        backend.calls(),
        vec![BackendCall::Set {
            key: "k".to_string(),
            value: "v".to_string()
        }]
    );

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.create, 0);
    assert_eq!(snapshot.errors, 1);
}

#[tokio::test]
async fn test_slow_backend_still_answers_json() {
    let backend = Arc::new(StallingBackend::new(Duration::from_millis(1500)));
    let server = TestServer::start(backend.clone()).await;

    let response = server
        .post("/create", &json!({"key": "slow", "value": "v"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body: Record = response.json().await.unwrap();
    assert_eq!(body.key, "slow");
    assert_eq!(backend.inner.len(), 1);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.create, 1);
    assert_eq!(snapshot.errors, 0);
}

// ============================================================================
// Identifier Failures
// ============================================================================

#[tokio::test]
async fn test_clock_rollback_fails_before_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let generator = GeneratorConfig::default();
    let clock = Arc::new(ManualClock::new(Utc::now().timestamp_millis()));
    let ids = IdGenerator::with_clock(Arc::clone(&clock), generator.start_time, generator.machine_id)
        .unwrap();
    let server = TestServer::start_with_ids(backend.clone(), Arc::new(ids)).await;

    // Wall clock now reads earlier than anything the generator has seen.
    clock.set(generator.start_time.timestamp_millis() - 1000);

    for (path, body) in [
        ("/create", json!({"key": "k", "value": "v"})),
        ("/read", json!({"key": "k"})),
        ("/update", json!({"key": "k", "value": "v2"})),
        ("/delete", json!({"key": "k"})),
    ] {
        let response = server.post(path, &body).await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{path}"
        );
        assert_eq!(response.headers()["content-type"], "application/json");
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.error.code, 5004);
    }

    assert_eq!(backend.command_count(), 0);

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.errors, 4);
    assert_eq!(
        snapshot.create + snapshot.read + snapshot.update + snapshot.delete,
        0
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates() {
    const N: usize = 64;
    let (server, backend) = server().await;
    let server = Arc::new(server);

    let tasks: Vec<_> = (0..N)
        .map(|i| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let response = server
                    .post("/create", &json!({"key": format!("key-{i}"), "value": "v"}))
                    .await;
                assert_eq!(response.status(), StatusCode::OK);
                response.json::<Record>().await.unwrap().uid
            })
        })
        .collect();

    let mut uids = HashSet::new();
    for task in tasks {
        assert!(uids.insert(task.await.unwrap()));
    }

    assert_eq!(uids.len(), N);
    assert_eq!(server.metrics.get(Counter::Create), N as i32);
    assert_eq!(backend.len(), N);
}
