use crate::config::CacheConfig;
use crate::domain::ports::{FetchFuture, GroupCache};
use crate::domain::reference::GroupMembers;
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedGroup {
    members: GroupMembers,
    ttl: Duration,
}

/// Expires each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl Expiry<String, CachedGroup> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedGroup,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Group membership cache backed by moka.
///
/// Misses go through `try_get_with`, so concurrent lookups of one key collapse
/// into a single fetch and every waiter receives its result. Errors are shared
/// with the waiters but never stored.
///
/// `Clone` shares the underlying cache.
#[derive(Clone)]
pub struct MokaGroupCache {
    inner: Cache<String, CachedGroup>,
}

impl MokaGroupCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.get(key).await.is_some()
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Approximate entry count; pending maintenance is flushed first.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

impl Default for MokaGroupCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl GroupCache for MokaGroupCache {
    async fn get_or_fetch<'a>(
        &self,
        key: String,
        ttl: Duration,
        fetch: FetchFuture<'a>,
    ) -> Result<GroupMembers> {
        let cached = self
            .inner
            .try_get_with(key, async move {
                let members = fetch.await?;
                Ok::<_, CatalogError>(CachedGroup { members, ttl })
            })
            .await?;
        Ok(cached.members)
    }
}
