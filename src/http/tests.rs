//! Tests for the HTTP module

use super::*;
use crate::error::Error;
use crate::types::Method;
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Request Tests
// ============================================================================

#[test]
fn test_request_builder() {
    let request = Request::get("https://api.example.com/items")
        .with_query("page", "1")
        .with_query("limit", "10")
        .with_header("X-Request-Id", "abc123");

    assert_eq!(request.method, Method::GET);
    assert_eq!(request.query.get("page"), Some(&"1".to_string()));
    assert_eq!(request.query.get("limit"), Some(&"10".to_string()));
    assert_eq!(request.header("x-request-id"), Some("abc123"));
    assert!(request.body.is_none());
}

#[test]
fn test_request_query_order_is_irrelevant() {
    let a = Request::get("https://api.example.com/items")
        .with_query("a", "1")
        .with_query("b", "2");
    let b = Request::get("https://api.example.com/items")
        .with_query("b", "2")
        .with_query("a", "1");
    assert_eq!(a, b);
}

#[test]
fn test_request_follow_merges_query() {
    let request = Request::get("https://api.example.com/items")
        .with_query("per_page", "50")
        .with_query("page", "1");

    let next = request
        .follow("https://api.example.com/items?page=2")
        .unwrap();

    assert_eq!(next.url, "https://api.example.com/items");
    assert_eq!(next.query.get("page"), Some(&"2".to_string()));
    assert_eq!(next.query.get("per_page"), Some(&"50".to_string()));
}

#[test]
fn test_request_follow_relative_link() {
    let request = Request::get("https://api.example.com/v1/items")
        .with_query("per_page", "50")
        .with_query("page", "1");

    let next = request.follow("/v1/items?page=2").unwrap();
    assert_eq!(next.url, "https://api.example.com/v1/items");
    assert_eq!(next.query.get("page"), Some(&"2".to_string()));
    assert_eq!(next.query.get("per_page"), Some(&"50".to_string()));

    let next = request.follow("?page=3").unwrap();
    assert_eq!(next.url, "https://api.example.com/v1/items");
    assert_eq!(next.query.get("page"), Some(&"3".to_string()));
}

#[test]
fn test_request_follow_rejects_garbage() {
    let request = Request::get("https://api.example.com/items");
    assert!(request.follow("http://[::1").is_err());
}

#[test]
fn test_request_full_url() {
    let request = Request::get("https://api.example.com/items")
        .with_query("page", "3")
        .with_query("a", "b");
    assert_eq!(request.full_url(), "https://api.example.com/items?a=b&page=3");
}

#[test]
fn test_request_with_json() {
    let request = Request::new(Method::POST, "https://api.example.com/items")
        .with_json(&serde_json::json!({"name": "x"}))
        .unwrap();
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.body.as_deref(), Some(&b"{\"name\":\"x\"}"[..]));
}

// ============================================================================
// Response Tests
// ============================================================================

#[test]
fn test_response_headers_case_insensitive() {
    let response = Response::new(200).with_header("Content-Type", "application/json; charset=utf-8");
    assert_eq!(
        response.header("content-type"),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(response.content_type(), Some("application/json"));
}

#[test]
fn test_response_links() {
    let response = Response::new(200).with_header(
        "Link",
        r#"<https://api.example.com/items?page=2>; rel="next", <https://api.example.com/items?page=5>; rel="last""#,
    );
    let links = response.links();
    assert_eq!(
        links.get("next").map(String::as_str),
        Some("https://api.example.com/items?page=2")
    );
    assert_eq!(
        links.get("last").map(String::as_str),
        Some("https://api.example.com/items?page=5")
    );
}

#[test]
fn test_response_without_links() {
    assert!(Response::new(200).links().is_empty());
}

#[test]
fn test_response_json() {
    let response = Response::new(200).with_json(&serde_json::json!({"page": 3}));
    let value: serde_json::Value = response.json().unwrap();
    assert_eq!(value["page"], 3);

    let bad = Response::new(200).with_body("not json");
    assert!(matches!(
        bad.json::<serde_json::Value>(),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn test_response_is_success() {
    assert!(Response::new(200).is_success());
    assert!(Response::new(204).is_success());
    assert!(!Response::new(304).is_success());
    assert!(!Response::new(500).is_success());
}

// ============================================================================
// ReqwestTransport Tests
// ============================================================================

#[tokio::test]
async fn test_transport_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{"id": 1, "name": "Alice"}]
        })))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = Request::get(format!("{}/api/users", mock_server.uri()));
    let response = transport.send(&request).await.unwrap();

    assert_eq!(response.status, 200);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["users"][0]["name"], "Alice");
}

#[tokio::test]
async fn test_transport_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "test"))
        .and(query_param("page", "2"))
        .and(header("X-Request-Id", "req-456"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = Request::get(format!("{}/api/search", mock_server.uri()))
        .with_query("q", "test")
        .with_query("page", "2")
        .with_header("X-Request-Id", "req-456");

    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_transport_post_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(body_string(r#"{"name":"test"}"#))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = Request::new(Method::POST, format!("{}/api/items", mock_server.uri()))
        .with_json(&serde_json::json!({"name": "test"}))
        .unwrap();

    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_transport_does_not_raise_for_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = Request::get(format!("{}/api/missing", mock_server.uri()));
    let response = transport.send(&request).await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.text().unwrap(), "Not found");
}

#[tokio::test]
async fn test_transport_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let transport =
        ReqwestTransport::with_config(TransportConfig::default().timeout(Duration::from_millis(50)))
            .unwrap();
    let request = Request::get(format!("{}/api/slow", mock_server.uri()));
    let err = transport.send(&request).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50, .. }));
    assert!(err.is_transport());
    assert_eq!(err.request().unwrap().url, request.url);
}

#[tokio::test]
async fn test_transport_connection_refused() {
    // Nothing listens on port 9 of localhost in test environments
    let transport = ReqwestTransport::new().unwrap();
    let request = Request::get("http://127.0.0.1:9/nothing");
    let err = transport.send(&request).await.unwrap_err();
    assert!(err.is_transport());
}

#[test]
fn test_transport_debug() {
    let transport = ReqwestTransport::new().unwrap();
    let debug_str = format!("{transport:?}");
    assert!(debug_str.contains("ReqwestTransport"));
    assert!(debug_str.contains("config"));
}
