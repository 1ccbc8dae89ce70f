//! Tiered cache stage

use super::types::{CacheBackend, CacheKey, CachePolicy, CachedResponse};
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::pipeline::{Context, Next, Stage};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Freshness marker plus value store, falling back to the last good value
/// when the inner pipeline fails with a transport error.
///
/// Only successful (2xx) responses are stored. Backend failures are logged
/// and treated as misses; they never fail the request.
pub struct TieredCache {
    policy: CachePolicy,
    values: Arc<dyn CacheBackend>,
    freshness: Option<Arc<dyn CacheBackend>>,
}

impl TieredCache {
    /// Create the stage.
    ///
    /// A policy with a freshness TTL needs a freshness store; omitting it is
    /// a configuration error reported here rather than on first use.
    pub fn new(
        policy: CachePolicy,
        values: Arc<dyn CacheBackend>,
        freshness: Option<Arc<dyn CacheBackend>>,
    ) -> Result<Self> {
        if policy.fresh_ttl.is_some() && freshness.is_none() {
            return Err(Error::missing_collaborator("freshness cache backend"));
        }
        policy.check();
        Ok(Self {
            policy,
            values,
            freshness,
        })
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn key_for(&self, request: &Request, ctx: &Context) -> CacheKey {
        match &ctx.cache_key {
            Some(key) => CacheKey::custom(key.clone()),
            None => CacheKey::for_request(request),
        }
    }

    async fn is_fresh(&self, key: &CacheKey) -> bool {
        let Some(freshness) = &self.freshness else {
            return false;
        };
        let marker = key.freshness_key(&self.policy.fresh_suffix);
        match freshness.get(&marker).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!("Freshness lookup failed for {}: {}", key, e);
                false
            }
        }
    }

    async fn load(&self, key: &CacheKey) -> Option<Response> {
        let bytes = match self.values.get(key.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", key, e);
                return None;
            }
        };
        match CachedResponse::from_bytes(&bytes).and_then(|c| c.restore()) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, response: &Response) {
        let bytes = match CachedResponse::capture(response).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self
            .values
            .set(key.as_str(), bytes, self.policy.value_ttl)
            .await
        {
            warn!("Failed to store cache entry {}: {}", key, e);
            return;
        }

        if let (Some(freshness), Some(ttl)) = (&self.freshness, self.policy.fresh_ttl) {
            let marker = key.freshness_key(&self.policy.fresh_suffix);
            if let Err(e) = freshness.set(&marker, Bytes::from_static(b"1"), ttl).await {
                warn!("Failed to set freshness marker {}: {}", marker, e);
            }
        }
    }
}

#[async_trait]
impl Stage for TieredCache {
    fn name(&self) -> &'static str {
        "tiered_cache"
    }

    async fn process(
        &self,
        request: Request,
        ctx: &mut Context,
        next: Next<'_>,
    ) -> Result<Response> {
        if !self.policy.is_cacheable(&request) {
            return next.run(request, ctx).await;
        }

        let key = self.key_for(&request, ctx);

        if !ctx.force_cache_regen && self.is_fresh(&key).await {
            if let Some(response) = self.load(&key).await {
                debug!("Fresh cache hit for {}", key);
                return Ok(response);
            }
            debug!("Freshness marker without value for {}", key);
        }

        match next.run(request, ctx).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(&key, &response).await;
                }
                Ok(response)
            }
            Err(e) if e.is_transport() => match self.load(&key).await {
                Some(response) => {
                    warn!("Serving cached response for {} after error: {}", key, e);
                    Ok(response)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("policy", &self.policy)
            .field("has_freshness", &self.freshness.is_some())
            .finish_non_exhaustive()
    }
}
