//! Cache storage: the `CacheStore` capability and its in-process backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use metrics::counter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Key/value cache with per-entry TTL.
///
/// Implementations must treat every operation as best-effort from the
/// caller's point of view; callers log and degrade on `CacheError`
/// rather than propagating it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry whose key starts with `prefix`. Used to
    /// invalidate all listing pages touched by a counter change.
    async fn remove_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

struct Slot {
    value: Bytes,
    expires_at: Instant,
}

/// In-process `CacheStore` over a concurrent map with lazy expiry.
///
/// Expired entries are dropped on the read that observes them; there is
/// no background sweeper.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        if let Some(slot) = self.entries.get(key) {
            if slot.expires_at > Instant::now() {
                counter!("mercato_cache_hit_total").increment(1);
                return Ok(Some(slot.value.clone()));
            }
        } else {
            counter!("mercato_cache_miss_total").increment(1);
            return Ok(None);
        }
        // Observed an expired slot; drop it and report a miss.
        self.entries.remove(key);
        counter!("mercato_cache_miss_total").increment(1);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        self.entries.retain(|key, _| !key.starts_with(prefix));
        counter!("mercato_cache_invalidate_total").increment(1);
        Ok(())
    }
}
