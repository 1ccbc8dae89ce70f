//! Request and response types
//!
//! Plain-data HTTP values passed through the pipeline. A `Request` is never
//! mutated in place once issued; stages that need to alter it build a new
//! one with the `with_*` helpers.

use super::url::{join_link, split_query};
use crate::error::{Error, Result};
use crate::link::parse_link_header;
use crate::types::{Method, QueryMap, StringMap};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

// ============================================================================
// Request
// ============================================================================

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute URL without its query string
    pub url: String,
    /// Query parameters (order-insensitive)
    pub query: QueryMap,
    /// Request headers
    pub headers: StringMap,
    /// Opaque request body
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request with no parameters, headers or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: QueryMap::new(),
            headers: StringMap::new(),
            body: None,
        }
    }

    /// Shorthand for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a raw body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body and the matching content type
    pub fn with_json(self, body: &serde_json::Value) -> Result<Self> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(bytes))
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Build the request for a followed link.
    ///
    /// Relative links resolve against this request's URL. The link's query
    /// string is merged over the current parameters, so parameters the link
    /// does not mention are carried forward.
    pub fn follow(&self, link: &str) -> Result<Self> {
        let (url, link_query) = split_query(&join_link(&self.url, link)?)?;
        let mut next = self.clone();
        next.url = url;
        next.query.extend(link_query);
        Ok(next)
    }

    /// Full URL including the query string, for logging
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.url, query.join("&"))
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response produced by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers (case-insensitive keys)
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
    /// URL the response was served from
    pub url: String,
}

impl Response {
    /// Create an empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url: String::new(),
        }
    }

    /// Add a header. Names or values that are not valid HTTP are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and content type
    #[must_use]
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Set the URL the response came from
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Media type from `Content-Type`, without parameters
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }

    /// Link relations from every `Link` header, keyed by relation name
    pub fn links(&self) -> HashMap<String, String> {
        let mut links = HashMap::new();
        for value in self.headers.get_all("link") {
            if let Ok(value) = value.to_str() {
                for (rel, url) in parse_link_header(value) {
                    links.entry(rel).or_insert(url);
                }
            }
        }
        links
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| Error::decode(format!("Response body is not UTF-8: {e}")))
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })
    }
}
