//! In-Process Memory Cache
//!
//! Keyed memoization with per-entry expiry. Entries are grouped into
//! regions; a `CacheRegion` is the capability to read and invalidate one
//! region and is handed to the service that owns that data.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::DomainResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    region: &'static str,
    key: String,
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

/// Shared memory cache, created once per application
pub struct MemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            ttl,
        })
    }

    /// Capability scoped to one region of this cache
    pub fn region(self: &Arc<Self>, name: &'static str) -> CacheRegion {
        CacheRegion {
            cache: Arc::clone(self),
            name,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get<V: Clone + 'static>(&self, key: &CacheKey) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        // A type mismatch behaves as a miss and is overwritten on insert
        entry.value.downcast_ref::<V>().cloned()
    }

    fn insert<V: Send + Sync + 'static>(&self, key: CacheKey, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn remove_region(&self, region: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.region != region);
        before.saturating_sub(self.entries.len())
    }
}

/// Read/invalidate access to one region of a `MemoryCache`
#[derive(Clone)]
pub struct CacheRegion {
    cache: Arc<MemoryCache>,
    name: &'static str,
}

impl CacheRegion {
    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// Failed computations are not cached.
    pub async fn get_or_try_insert<V, F, Fut>(&self, key: impl Into<String>, compute: F) -> DomainResult<V>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<V>>,
    {
        let key = CacheKey {
            region: self.name,
            key: key.into(),
        };

        if let Some(value) = self.cache.get::<V>(&key) {
            log::debug!("cache hit {}:{}", key.region, key.key);
            return Ok(value);
        }

        log::debug!("cache miss {}:{}", key.region, key.key);
        let value = compute().await?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every entry of this region
    pub fn invalidate(&self) {
        let removed = self.cache.remove_region(self.name);
        log::debug!("invalidated cache region {} ({} entries)", self.name, removed);
    }
}
