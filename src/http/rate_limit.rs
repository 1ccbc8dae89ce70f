//! Client-wide request throttling
//!
//! One token bucket per client. Every request that reaches the rate limit
//! stage takes a token, so a concurrent page run stays under the configured
//! rate no matter how many workers it has in flight: the workers share the
//! client's bucket rather than owning one each.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rate and burst of a client's token bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before throttling starts
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_burst() -> u32 {
    10
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(10, default_burst())
    }
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Steady-state gap between two requests once the burst is spent
    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }

    /// Zero rate or burst is raised to one
    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(rate).allow_burst(burst)
    }
}

type Bucket = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Shared token bucket. Clones draw from the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Bucket>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(Governor::direct(config.quota())),
            config: *config,
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Take one token, waiting for the bucket to refill when it is empty
    pub async fn wait(&self) {
        if self.bucket.check().is_ok() {
            return;
        }
        debug!(
            "Rate limit of {}/s reached, waiting",
            self.config.requests_per_second
        );
        self.bucket.until_ready().await;
    }

    /// Take one token if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_config_from_yaml_defaults_burst() {
        let config: RateLimiterConfig =
            serde_yaml::from_str("requests_per_second: 5").unwrap();
        assert_eq!(config, RateLimiterConfig::new(5, 10));
        assert_eq!(config.interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_zero_rate_is_raised_to_one() {
        let config = RateLimiterConfig::new(0, 0);
        assert_eq!(config.interval(), Duration::from_secs(1));

        let limiter = RateLimiter::new(&config);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clones_share_one_bucket() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(1, 3));

        let workers: Vec<_> = (0..6)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_acquire() })
            })
            .collect();

        let mut granted = 0;
        for worker in workers {
            if worker.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 3);
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_wait_spaces_requests_after_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(20, 1));

        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        // Two refills at 50ms each
        assert!(start.elapsed() >= Duration::from_millis(80), "{:?}", start.elapsed());
    }
}
