//! Built-in pipeline stages
//!
//! Stages are listed here in the order `ClientBuilder` installs them,
//! outermost first.

use super::types::{Context, Next, Stage};
use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::http::{RateLimiter, Request, Response};
use crate::types::{BackoffType, StringMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// Query logging
// ============================================================================

/// Logs every request as `METHOD: url [query]` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryLogStage;

#[async_trait]
impl Stage for QueryLogStage {
    fn name(&self) -> &'static str {
        "query_log"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        let query: Vec<String> = request
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        info!("{}: {} [{}]", request.method, request.url, query.join(", "));
        next.run(request, ctx).await
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Retry policy for `RetryStage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Growth of the delay between attempts
    #[serde(default)]
    pub backoff: BackoffType,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_retries` and default backoff
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff = backoff;
        self.initial_backoff_ms = initial.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Delay before retry number `attempt + 1`, never above the maximum
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.initial_backoff_ms);
        let max = Duration::from_millis(self.max_backoff_ms);
        let delay = match self.backoff {
            BackoffType::Constant => Some(initial),
            BackoffType::Linear => initial.checked_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => 2u32
                .checked_pow(attempt)
                .and_then(|factor| initial.checked_mul(factor)),
        };

        delay.map_or(max, |delay| delay.min(max))
    }
}

/// Retries requests that fail with a retryable transport error.
///
/// A 429 response waits for its `Retry-After` header (capped at the maximum
/// backoff) instead of the computed delay. Once retries are exhausted a 429
/// surfaces as `Error::RateLimited`.
#[derive(Debug, Clone, Default)]
pub struct RetryStage {
    policy: RetryPolicy,
}

impl RetryStage {
    /// Create a retry stage
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

/// Seconds from a `Retry-After` header, if present and numeric
fn retry_after(error: &Error) -> Option<u64> {
    error
        .response()
        .filter(|r| r.status == 429)
        .and_then(|r| r.header("retry-after"))
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl Stage for RetryStage {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        let max_retries = self.policy.max_retries;
        let mut attempt = 0;

        loop {
            let error = match next.run(request.clone(), ctx).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= max_retries {
                if error.status() == Some(429) {
                    return Err(Error::RateLimited {
                        request: Box::new(request),
                        retry_after_seconds: retry_after(&error).unwrap_or(0),
                    });
                }
                return Err(error);
            }

            let max = Duration::from_millis(self.policy.max_backoff_ms);
            let delay = match retry_after(&error) {
                Some(seconds) => std::cmp::min(Duration::from_secs(seconds), max),
                None => self.policy.calculate_backoff(attempt),
            };
            warn!(
                "{}, attempt {}/{}, retrying in {:?}",
                error,
                attempt + 1,
                max_retries + 1,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

// ============================================================================
// Status raising
// ============================================================================

/// Turns non-2xx responses into `Error::HttpStatus`
#[derive(Debug, Clone, Copy, Default)]
pub struct RaiseForStatusStage;

#[async_trait]
impl Stage for RaiseForStatusStage {
    fn name(&self) -> &'static str {
        "raise_for_status"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        let response = next.run(request.clone(), ctx).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::http_status(&request, response))
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Applies an `Authenticator` to every request
#[derive(Debug, Clone)]
pub struct AuthStage {
    authenticator: Authenticator,
}

impl AuthStage {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }
}

#[async_trait]
impl Stage for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        next.run(self.authenticator.apply(request), ctx).await
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Waits on a shared token bucket before every request
#[derive(Debug, Clone)]
pub struct RateLimitStage {
    limiter: RateLimiter,
}

impl RateLimitStage {
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        self.limiter.wait().await;
        next.run(request, ctx).await
    }
}

// ============================================================================
// Default headers
// ============================================================================

/// Adds session default headers and `User-Agent`.
///
/// Headers already present on the request win.
#[derive(Debug, Clone)]
pub struct HeadersStage {
    headers: StringMap,
}

impl HeadersStage {
    /// Stage with the default `pagewise/<version>` user agent
    pub fn new(headers: StringMap) -> Self {
        Self::with_user_agent(
            headers,
            format!("pagewise/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Stage with a custom user agent
    pub fn with_user_agent(mut headers: StringMap, user_agent: impl Into<String>) -> Self {
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            headers.insert("User-Agent".to_string(), user_agent.into());
        }
        Self { headers }
    }
}

#[async_trait]
impl Stage for HeadersStage {
    fn name(&self) -> &'static str {
        "headers"
    }

    async fn process(
        &self,
        mut request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        for (key, value) in &self.headers {
            if request.header(key).is_none() {
                request.headers.insert(key.clone(), value.clone());
            }
        }
        debug!("{} headers on {}", request.headers.len(), request.url);
        next.run(request, ctx).await
    }
}
