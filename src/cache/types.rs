//! Cache types: backend trait, keys, policy and the stored envelope

use crate::error::{Error, Result};
use crate::http::url::split_query;
use crate::http::{Request, Response};
use crate::types::{Method, QueryMap};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Backend
// ============================================================================

/// Storage behind a cache level.
///
/// Expiry is the backend's concern: `get` must not return an entry whose
/// `ttl` has elapsed.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;
}

// ============================================================================
// Cache Key
// ============================================================================

/// Identity of a cacheable request: method, query-less URL and sorted
/// parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `request`.
    ///
    /// Parameters embedded in the URL are merged with the query map first,
    /// so `?b=2&a=1` and `{a: 1, b: 2}` produce the same key.
    pub fn for_request(request: &Request) -> Self {
        let (url, query) = match split_query(&request.url) {
            Ok((url, embedded)) => {
                let mut query = request.query.clone();
                query.extend(embedded);
                (url, query)
            }
            Err(_) => (request.url.clone(), request.query.clone()),
        };
        Self::from_parts(request.method, &url, &query)
    }

    fn from_parts(method: Method, url: &str, query: &QueryMap) -> Self {
        let mut key = format!("{method} {url}");
        for (name, value) in query {
            key.push(' ');
            key.push_str(name);
            key.push(':');
            key.push_str(value);
        }
        Self(key)
    }

    /// A caller-chosen key
    pub fn custom(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of the freshness marker for this entry
    pub fn freshness_key(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Which requests are cached, and for how long
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Per-method URL patterns, anchored at the start of the path
    pub rules: HashMap<Method, Vec<Regex>>,
    /// Lifetime of stored values
    pub value_ttl: Duration,
    /// Lifetime of the freshness marker; `None` keeps the cache as a
    /// fallback only and always fetches
    pub fresh_ttl: Option<Duration>,
    /// Appended to the cache key to form the marker key
    pub fresh_suffix: String,
    /// Stripped from URLs before matching rules
    pub base_url: Option<String>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            value_ttl: Duration::from_secs(604_800),
            fresh_ttl: Some(Duration::from_secs(3600)),
            fresh_suffix: ":fresh".to_string(),
            base_url: None,
        }
    }
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache every GET request
    #[must_use]
    pub fn cache_all_gets(mut self) -> Self {
        self.rules.insert(Method::GET, vec![MATCH_ALL.clone()]);
        self
    }

    /// Cache `method` requests whose path matches `pattern`
    pub fn rule(mut self, method: Method, pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})"))?;
        self.rules.entry(method).or_default().push(anchored);
        Ok(self)
    }

    #[must_use]
    pub fn value_ttl(mut self, ttl: Duration) -> Self {
        self.value_ttl = ttl;
        self
    }

    #[must_use]
    pub fn fresh_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.fresh_ttl = ttl;
        self
    }

    #[must_use]
    pub fn fresh_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.fresh_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether `request` falls under a rule
    pub fn is_cacheable(&self, request: &Request) -> bool {
        let Some(patterns) = self.rules.get(&request.method) else {
            return false;
        };
        let path = self.relative_path(&request.url);
        patterns.iter().any(|p| p.is_match(path))
    }

    fn relative_path<'a>(&self, url: &'a str) -> &'a str {
        let url = match &self.base_url {
            Some(base) => url.strip_prefix(base.as_str()).unwrap_or(url),
            None => url,
        };
        url.trim_matches('/')
    }

    /// Log configurations that refetch more often than intended
    pub(crate) fn check(&self) {
        if let Some(fresh) = self.fresh_ttl {
            if fresh > self.value_ttl {
                warn!(
                    "Freshness TTL {:?} exceeds value TTL {:?}; values may expire while marked fresh",
                    fresh, self.value_ttl
                );
            }
        }
    }
}

static MATCH_ALL: Lazy<Regex> = Lazy::new(|| Regex::new("").expect("empty pattern"));

// ============================================================================
// Stored Envelope
// ============================================================================

/// A response as held in the value store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Base64 encoded body
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Capture `response` as fetched now
    pub fn capture(response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self {
            status: response.status,
            url: response.url.clone(),
            headers,
            body: STANDARD.encode(&response.body),
            fetched_at: Utc::now(),
        }
    }

    /// Rebuild the response
    pub fn restore(&self) -> Result<Response> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::decode(format!("Invalid cached header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::decode(format!("Invalid cached header value: {e}")))?;
            headers.append(name, value);
        }
        let body = STANDARD
            .decode(&self.body)
            .map_err(|e| Error::decode(format!("Invalid cached body: {e}")))?;
        Ok(Response {
            status: self.status,
            headers,
            body: Bytes::from(body),
            url: self.url.clone(),
        })
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
