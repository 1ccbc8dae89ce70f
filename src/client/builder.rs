//! Client builder

use super::session::Client;
use crate::auth::{AuthConfig, Authenticator};
use crate::cache::{CacheBackend, CachePolicy, MemoryCache, TieredCache};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{RateLimiter, RateLimiterConfig, ReqwestTransport, Transport, TransportConfig};
use crate::link::{LinkFollower, Rfc5988Follower};
use crate::pagination::PaginationConfig;
use crate::pipeline::{
    AuthStage, HeadersStage, Pipeline, QueryLogStage, RaiseForStatusStage, RateLimitStage,
    RetryPolicy, RetryStage, Stage,
};
use crate::types::StringMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for `Client`
pub struct ClientBuilder {
    base_url: Option<String>,
    trailing_slash: bool,
    headers: StringMap,
    user_agent: Option<String>,
    auth: AuthConfig,
    rate_limit: Option<RateLimiterConfig>,
    retry: Option<RetryPolicy>,
    raise_for_status: bool,
    log_queries: bool,
    cache: Option<CachePolicy>,
    value_store: Option<Arc<dyn CacheBackend>>,
    freshness_store: Option<Arc<dyn CacheBackend>>,
    transport: Option<Arc<dyn Transport>>,
    transport_config: TransportConfig,
    follower: Option<Arc<dyn LinkFollower>>,
    pagination: PaginationConfig,
    stages: Vec<Arc<dyn Stage>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            trailing_slash: false,
            headers: StringMap::new(),
            user_agent: None,
            auth: AuthConfig::None,
            rate_limit: None,
            retry: None,
            raise_for_status: true,
            log_queries: false,
            cache: None,
            value_store: None,
            freshness_store: None,
            transport: None,
            transport_config: TransportConfig::default(),
            follower: None,
            pagination: PaginationConfig::default(),
            stages: Vec::new(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a configuration. Cache backends, when a cache is
    /// configured, are in-memory.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Self {
            base_url: config.base_url.clone(),
            trailing_slash: config.trailing_slash,
            headers: config.headers.clone(),
            user_agent: config.user_agent.clone(),
            auth: config.auth.clone(),
            rate_limit: config.rate_limit,
            retry: config.retry.clone(),
            raise_for_status: config.raise_for_status,
            log_queries: config.log_queries,
            transport_config: config.transport_config(),
            pagination: config.pagination.clone(),
            ..Self::default()
        };
        if let Some(cache) = &config.cache {
            builder = builder.cache(cache.policy()?).memory_cache();
        }
        Ok(builder)
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn raise_for_status(mut self, enabled: bool) -> Self {
        self.raise_for_status = enabled;
        self
    }

    #[must_use]
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Enable the tiered cache. Backends must be supplied separately.
    #[must_use]
    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    /// Long-lived store for cached responses
    #[must_use]
    pub fn value_store(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.value_store = Some(backend);
        self
    }

    /// Short-lived store for freshness markers
    #[must_use]
    pub fn freshness_store(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.freshness_store = Some(backend);
        self
    }

    /// Use separate in-memory stores for values and markers
    #[must_use]
    pub fn memory_cache(self) -> Self {
        self.value_store(Arc::new(MemoryCache::new()))
            .freshness_store(Arc::new(MemoryCache::new()))
    }

    /// Send through `transport` instead of reqwest
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport_config = self.transport_config.timeout(timeout);
        self
    }

    /// Replace the `Link` header follower
    #[must_use]
    pub fn follower(mut self, follower: Arc<dyn LinkFollower>) -> Self {
        self.follower = Some(follower);
        self
    }

    #[must_use]
    pub fn pagination(mut self, config: PaginationConfig) -> Self {
        self.pagination = config;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.pagination.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.pagination.max_pages = max_pages;
        self
    }

    /// Add a custom stage. Custom stages run inside status raising and
    /// outside authentication, in the order added.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Assemble the pipeline.
    ///
    /// Fails when a cache is configured without its backends.
    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_config(self.transport_config)?),
        };
        let mut pipeline = Pipeline::new(transport);

        if self.log_queries {
            pipeline.push(Arc::new(QueryLogStage));
        }
        if let Some(mut policy) = self.cache {
            let values = self
                .value_store
                .ok_or_else(|| Error::missing_collaborator("value cache backend"))?;
            if policy.base_url.is_none() {
                policy.base_url = self.base_url.clone();
            }
            pipeline.push(Arc::new(TieredCache::new(
                policy,
                values,
                self.freshness_store,
            )?));
        }
        if let Some(policy) = self.retry {
            pipeline.push(Arc::new(RetryStage::new(policy)));
        }
        if self.raise_for_status {
            pipeline.push(Arc::new(RaiseForStatusStage));
        }
        for stage in self.stages {
            pipeline.push(stage);
        }
        if !self.auth.is_none() {
            pipeline.push(Arc::new(AuthStage::new(Authenticator::new(self.auth))));
        }
        if let Some(config) = &self.rate_limit {
            pipeline.push(Arc::new(RateLimitStage::new(RateLimiter::new(config))));
        }
        let headers = match self.user_agent {
            Some(agent) => HeadersStage::with_user_agent(self.headers, agent),
            None => HeadersStage::new(self.headers),
        };
        pipeline.push(Arc::new(headers));

        debug!("Client pipeline: {:?}", pipeline.stage_names());

        let follower = self.follower.unwrap_or_else(|| {
            Arc::new(Rfc5988Follower::new().with_page_param(self.pagination.page_param.clone()))
        });

        Ok(Client {
            pipeline: Arc::new(pipeline),
            base_url: self.base_url,
            trailing_slash: self.trailing_slash,
            follower,
            pagination: self.pagination,
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("cache", &self.cache.is_some())
            .field("custom_stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}
