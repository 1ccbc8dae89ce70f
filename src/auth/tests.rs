//! Tests for the auth module

use super::*;
use crate::http::Request;
use base64::Engine;
use std::collections::HashMap;

fn request() -> Request {
    Request::get("https://example.com/api")
}

#[test]
fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    assert_eq!(auth.apply(request()), request());
}

#[test]
fn test_token_auth() {
    let auth = Authenticator::new(AuthConfig::Token {
        token: "abc".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.header("Authorization"), Some("Token abc"));
}

#[test]
fn test_x_token_auth() {
    let auth = Authenticator::new(AuthConfig::XToken {
        token: "abc".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.header("X-Auth-Token"), Some("abc"));
    assert_eq!(req.header("Authorization"), None);
}

#[test]
fn test_bearer_auth() {
    let auth = Authenticator::new(AuthConfig::Bearer {
        token: "my-bearer-token".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.header("authorization"), Some("Bearer my-bearer-token"));
}

#[test]
fn test_basic_auth() {
    let auth = Authenticator::new(AuthConfig::Basic {
        username: "marty".to_string(),
        password: "mcfly".to_string(),
    });
    let req = auth.apply(request());

    let expected = base64::engine::general_purpose::STANDARD.encode("marty:mcfly");
    assert_eq!(
        req.header("Authorization"),
        Some(format!("Basic {expected}").as_str())
    );
}

#[test]
fn test_api_key_header_with_prefix() {
    let auth = Authenticator::new(AuthConfig::ApiKey {
        location: Location::Header,
        header_name: Some("X-API-Key".to_string()),
        query_param: None,
        prefix: Some("Key ".to_string()),
        value: "test-key-123".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.header("X-API-Key"), Some("Key test-key-123"));
}

#[test]
fn test_api_key_query() {
    let auth = Authenticator::new(AuthConfig::ApiKey {
        location: Location::Query,
        header_name: None,
        query_param: Some("apikey".to_string()),
        prefix: None,
        value: "secret123".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.query.get("apikey"), Some(&"secret123".to_string()));
}

#[test]
fn test_api_key_query_default_param() {
    let auth = Authenticator::new(AuthConfig::ApiKey {
        location: Location::Query,
        header_name: None,
        query_param: None,
        prefix: None,
        value: "k".to_string(),
    });
    let req = auth.apply(request());
    assert_eq!(req.query.get("api_key"), Some(&"k".to_string()));
}

#[test]
fn test_custom_headers() {
    let mut headers = HashMap::new();
    headers.insert("X-Custom-1".to_string(), "value1".to_string());
    headers.insert("X-Custom-2".to_string(), "value2".to_string());

    let auth = Authenticator::new(AuthConfig::CustomHeaders { headers });
    let req = auth.apply(request());

    assert_eq!(req.header("X-Custom-1"), Some("value1"));
    assert_eq!(req.header("X-Custom-2"), Some("value2"));
}
