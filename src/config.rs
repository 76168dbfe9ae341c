//! Runtime configuration for the engine and its collaborators.

use std::time::Duration;

/// Default lifetime of a cached group membership.
pub const DEFAULT_GROUP_TTL: Duration = Duration::from_secs(12 * 60 * 60);
/// Default cap on concurrent group resolutions per enrichment call.
pub const DEFAULT_CONCURRENCY: usize = 16;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_BASE_URL: &str = "https://api.dtn.com/fuelsuite/";
pub const DEFAULT_ACCEPT: &str = "application/vnd.dtn.energy.v2+JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on in-flight group resolutions. Zero is treated as one.
    pub concurrency: usize,
    /// TTL handed to the cache for every group lookup.
    pub group_ttl: Duration,
    /// When false, records are returned exactly as fetched.
    pub pull_reference_data_groups: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            group_ttl: DEFAULT_GROUP_TTL,
            pull_reference_data_groups: true,
        }
    }
}

impl EngineConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_group_ttl(mut self, ttl: Duration) -> Self {
        self.group_ttl = ttl;
        self
    }

    pub fn without_groups(mut self) -> Self {
        self.pull_reference_data_groups = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Exponential backoff: retry `n` waits `base_delay * 2^n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub accept: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}
