//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use simple_cache::{
    api::{create_router, http_key},
    AppState, SimpleCache,
};
use std::thread::sleep;
use std::time::Duration;
use tower::ServiceExt;

// == Helper Functions ==

fn create_app(capacity: usize, ttl: Duration) -> Router {
    let cache = SimpleCache::new(capacity, 0.2, ttl, http_key);
    create_router(AppState::new(cache))
}

fn create_test_app() -> Router {
    create_app(100, Duration::from_secs(300))
}

fn set_request(key: &str, value: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "key": key, "value": value }).to_string(),
        ))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app.oneshot(set_request("test_key", "test_value")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["value"].as_str().unwrap(), "test_value");
}

#[tokio::test]
async fn test_set_endpoint_cache_full() {
    let app = create_app(2, Duration::from_secs(300));

    for key in ["a", "b"] {
        let response = app.clone().oneshot(set_request(key, "v")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(set_request("c", "v")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"].as_str().unwrap(), "cache is full");

    // Existing keys can still be updated
    let response = app.oneshot(set_request("a", "w")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = app.clone().oneshot(set_request("get_key", "get_value")).await.unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get_request("/get/get_key")).await.unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "get_key");
    assert_eq!(json["value"].as_str().unwrap(), "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/get/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
    assert!(json.get("stale").is_none());
}

// == MRU Endpoint Tests ==

#[tokio::test]
async fn test_mru_endpoint_follows_reads() {
    let app = create_test_app();

    for key in ["k1", "k2", "k3"] {
        app.clone().oneshot(set_request(key, key)).await.unwrap();
    }

    let response = app.clone().oneshot(get_request("/mru")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "k3");

    app.clone().oneshot(get_request("/get/k1")).await.unwrap();

    let response = app.oneshot(get_request("/mru")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "k1");
}

// == Stats and Clean Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    app.clone().oneshot(set_request("stats_key", "v")).await.unwrap();
    app.clone().oneshot(get_request("/get/stats_key")).await.unwrap();
    app.clone().oneshot(get_request("/get/missing")).await.unwrap();

    let response = app.oneshot(get_request("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    // The write counts one miss and one hit, the reads one hit and one miss
    assert_eq!(json["hits"].as_u64().unwrap(), 2);
    assert_eq!(json["misses"].as_u64().unwrap(), 2);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
    assert_eq!(json["capacity"].as_u64().unwrap(), 100);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_clean_endpoint() {
    let app = create_test_app();

    app.clone().oneshot(set_request("a", "1")).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clean")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get_request("/get/a")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get_request("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"].as_u64().unwrap(), 0);
    // The failed read above happened after the reset
    assert_eq!(json["hits"].as_u64().unwrap(), 0);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"invalid json"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = app.oneshot(set_request("", "test")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"].as_str().unwrap(), "Key cannot be empty");
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let app = create_app(100, Duration::from_secs(1));

    let set_response = app
        .clone()
        .oneshot(set_request("ttl_test", "expires_soon"))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.clone().oneshot(get_request("/get/ttl_test")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);

    // Wait for TTL to expire
    sleep(Duration::from_millis(1100));

    let get_response = app.clone().oneshot(get_request("/get/ttl_test")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::GONE);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["stale"].as_str().unwrap(), "expires_soon");

    let mru_response = app.oneshot(get_request("/mru")).await.unwrap();
    assert_eq!(mru_response.status(), StatusCode::GONE);
    let json = body_to_json(mru_response.into_body()).await;
    assert_eq!(json["stale"]["key"].as_str().unwrap(), "ttl_test");
}

// == End-to-End over a Socket ==

#[tokio::test]
async fn test_served_over_tcp() {
    let app = create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .put(format!("{}/set", base))
        .json(&serde_json::json!({ "key": "remote", "value": "over_tcp" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: Value = client
        .get(format!("{}/get/remote", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["value"].as_str().unwrap(), "over_tcp");

    server.abort();
}
