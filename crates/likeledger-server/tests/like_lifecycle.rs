use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::tempdir;
use tower::util::ServiceExt;

use likeledger_server::{AppState, ServerConfig, router};
use likeledger_store::{DurableLedger, LedgerOptions, MemorySnapshotStore};

async fn memory_app() -> (Arc<MemorySnapshotStore>, Router) {
    let store = Arc::new(MemorySnapshotStore::new());
    let options = LedgerOptions {
        retry_backoff: std::time::Duration::from_millis(1),
        ..LedgerOptions::default()
    };
    let ledger = DurableLedger::open(store.clone(), options).await.unwrap();
    (store, router(AppState::new(Arc::new(ledger))))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// The full like flow for one post, as the front-end drives it.
#[tokio::test]
async fn test_like_scenario() {
    let (_, app) = memory_app().await;

    let (status, body) = send(&app, post_json("/api/likes/42", json!({"address": "0xABCDEF1234567890"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1, "liked": true}));

    let (_, body) = send(&app, post_json("/api/likes/42", json!({"address": "0xABCDEF1234567890"}))).await;
    assert_eq!(body, json!({"count": 1, "liked": true}));

    let (_, body) = send(&app, post_json("/api/likes/42", json!({"address": "0x1111111111111111"}))).await;
    assert_eq!(body, json!({"count": 2, "liked": true}));

    let (status, body) = send(&app, get("/api/likes/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let mut liked_by: Vec<String> = serde_json::from_value(body["likedBy"].clone()).unwrap();
    liked_by.sort();
    assert_eq!(liked_by, vec!["0x1111111111111111", "0xABCDEF1234567890"]);
}

#[tokio::test]
async fn test_unknown_post_reports_zero() {
    let (_, app) = memory_app().await;
    send(&app, post_json("/api/likes/p1", json!({"address": "0xA"}))).await;

    let (status, body) = send(&app, get("/api/likes/nonexistent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 0, "likedBy": []}));
}

#[tokio::test]
async fn test_missing_or_blank_address_is_rejected() {
    let (store, app) = memory_app().await;

    let (status, body) = send(&app, post_json("/api/likes/42", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body.get("count").is_none());

    let (status, body) = send(&app, post_json("/api/likes/42", json!({"address": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("liked").is_none());

    let (status, _) = send(&app, post_json("/api/likes/42", json!({"address": 42}))).await;
    assert!(status.is_client_error());

    assert_eq!(store.save_count(), 0);
    let (_, body) = send(&app, get("/api/likes/42")).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_post_id_with_surrounding_whitespace_is_rejected() {
    let (store, app) = memory_app().await;

    let (status, body) = send(&app, post_json("/api/likes/%2042", json!({"address": "0xA"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = send(&app, get("/api/likes/42%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_storage_failure_is_not_reported_as_liked() {
    let (store, app) = memory_app().await;
    store.fail_next_saves(3);

    let (status, body) = send(&app, post_json("/api/likes/42", json!({"address": "0xA"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORAGE_UNAVAILABLE");
    assert!(body.get("liked").is_none());

    let (_, body) = send(&app, get("/api/likes/42")).await;
    assert_eq!(body["count"], 0);
    let (_, body) = send(&app, get("/api/likes/42/0xA")).await;
    assert_eq!(body, json!({"liked": false}));
}

#[tokio::test]
async fn test_has_liked_route() {
    let (_, app) = memory_app().await;
    send(&app, post_json("/api/likes/7", json!({"address": "0xA"}))).await;

    let (_, body) = send(&app, get("/api/likes/7/0xA")).await;
    assert_eq!(body, json!({"liked": true}));
    let (_, body) = send(&app, get("/api/likes/7/0xB")).await;
    assert_eq!(body, json!({"liked": false}));
    let (_, body) = send(&app, get("/api/likes/8/0xA")).await;
    assert_eq!(body, json!({"liked": false}));
}

#[tokio::test]
async fn test_likes_survive_restart() {
    let dir = tempdir().unwrap();
    let config = ServerConfig {
        snapshot_path: dir.path().join("data").join("likes.json"),
        ..ServerConfig::default()
    };

    {
        let app = router(AppState::from_config(&config).await.unwrap());
        let (status, _) = send(&app, post_json("/api/likes/42", json!({"address": "0xA"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let app = router(AppState::from_config(&config).await.unwrap());
    let (_, body) = send(&app, get("/api/likes/42")).await;
    assert_eq!(body, json!({"count": 1, "likedBy": ["0xA"]}));

    let on_disk: Value =
        serde_json::from_slice(&std::fs::read(&config.snapshot_path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"42": ["0xA"]}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_lose_no_likes() {
    let dir = tempdir().unwrap();
    let config = ServerConfig {
        snapshot_path: dir.path().join("likes.json"),
        ..ServerConfig::default()
    };
    let app = router(AppState::from_config(&config).await.unwrap());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let (status, body) = send(
                    &app,
                    post_json("/api/likes/hot", json!({"address": format!("0x{i:02x}")})),
                )
                .await;
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body["liked"], true);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let (_, body) = send(&app, get("/api/likes/hot")).await;
    assert_eq!(body["count"], 32);
    assert_eq!(body["likedBy"].as_array().unwrap().len(), 32);

    let reloaded = router(AppState::from_config(&config).await.unwrap());
    let (_, body) = send(&reloaded, get("/api/likes/hot")).await;
    assert_eq!(body["count"], 32);
}

#[tokio::test]
async fn test_health_reports_totals() {
    let (_, app) = memory_app().await;
    send(&app, post_json("/api/likes/1", json!({"address": "0xA"}))).await;
    send(&app, post_json("/api/likes/2", json!({"address": "0xA"}))).await;
    send(&app, post_json("/api/likes/2", json!({"address": "0xB"}))).await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "posts": 2, "likes": 3}));
}
