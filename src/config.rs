//! Configuration types for clients
//!
//! A `ClientConfig` describes one client session in YAML: where requests go,
//! which pipeline stages are installed, and how pages are fetched.
//!
//! ```yaml
//! base_url: https://api.github.com
//! auth:
//!   type: token
//!   token: ghp_xxx
//! cache:
//!   fresh_ttl_secs: 600
//!   rules:
//!     GET: ["users/", "repos/"]
//! pagination:
//!   concurrency: 4
//! ```

use crate::auth::AuthConfig;
use crate::cache::CachePolicy;
use crate::error::{Error, Result};
use crate::http::{RateLimiterConfig, TransportConfig};
use crate::pagination::PaginationConfig;
use crate::pipeline::RetryPolicy;
use crate::types::{Method, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL relative paths are joined to
    #[serde(default)]
    pub base_url: Option<String>,

    /// Append `/` to relative paths
    #[serde(default)]
    pub trailing_slash: bool,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// `User-Agent` override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Turn non-2xx responses into errors
    #[serde(default = "default_true")]
    pub raise_for_status: bool,

    /// Log every request at info level
    #[serde(default)]
    pub log_queries: bool,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Token-bucket rate limiting
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Retries for transient failures
    #[serde(default)]
    pub retry: Option<RetryPolicy>,

    /// Tiered response cache
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            trailing_slash: false,
            headers: StringMap::new(),
            user_agent: None,
            timeout_secs: default_timeout(),
            raise_for_status: true,
            log_queries: false,
            auth: AuthConfig::None,
            rate_limit: None,
            retry: None,
            cache: None,
            pagination: PaginationConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl ClientConfig {
    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse client YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if let Some(base) = &self.base_url {
            url::Url::parse(base)
                .map_err(|e| Error::config(format!("Invalid base_url '{base}': {e}")))?;
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Transport settings derived from this config
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::default().timeout(Duration::from_secs(self.timeout_secs))
    }
}

// ============================================================================
// Cache Config
// ============================================================================

/// Cache settings; backends are supplied by the client builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of stored values
    #[serde(default = "default_value_ttl")]
    pub value_ttl_secs: u64,

    /// Lifetime of the freshness marker; `null` disables fresh hits and
    /// keeps the cache as a fallback only
    #[serde(default = "default_fresh_ttl")]
    pub fresh_ttl_secs: Option<u64>,

    /// URL patterns per method. Empty caches every GET.
    #[serde(default)]
    pub rules: BTreeMap<Method, Vec<String>>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            value_ttl_secs: default_value_ttl(),
            fresh_ttl_secs: default_fresh_ttl(),
            rules: BTreeMap::new(),
        }
    }
}

fn default_value_ttl() -> u64 {
    604_800
}

fn default_fresh_ttl() -> Option<u64> {
    Some(3600)
}

impl CacheConfig {
    /// Compile the rules into a policy
    pub fn policy(&self) -> Result<CachePolicy> {
        let mut policy = CachePolicy::new()
            .value_ttl(Duration::from_secs(self.value_ttl_secs))
            .fresh_ttl(self.fresh_ttl_secs.map(Duration::from_secs));

        if self.rules.is_empty() {
            return Ok(policy.cache_all_gets());
        }
        for (method, patterns) in &self.rules {
            for pattern in patterns {
                policy = policy.rule(*method, pattern)?;
            }
        }
        Ok(policy)
    }
}
