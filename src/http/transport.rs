//! Transport collaborator
//!
//! The pipeline's innermost call. `Transport` is the only seam that touches
//! the network; everything above it works on plain `Request`/`Response`
//! values, so tests can swap in a scripted transport.

use super::types::{Request, Response};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Sends a request and returns whatever the server answered.
///
/// Implementations report network and protocol failures as transport-class
/// errors (`Error::is_transport`). They must not interpret the status code:
/// raising on non-2xx is a pipeline stage.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip
    async fn send(&self, request: &Request) -> Result<Response>;
}

/// Configuration for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

impl TransportConfig {
    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the redirect limit
    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            config: TransportConfig::default(),
        }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    fn classify(&self, request: &Request, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            return Error::Timeout {
                request: Box::new(request.clone()),
                timeout_ms: self.config.timeout.as_millis() as u64,
            };
        }
        Error::Http {
            request: Box::new(request.clone()),
            source: error,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        let mut req = self
            .client
            .request(request.method.into(), request.url.as_str());

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let response = req.send().await.map_err(|e| self.classify(request, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(request, e))?;

        debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.full_url(),
            status,
            body.len()
        );

        Ok(Response {
            status,
            headers,
            body,
            url,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
