use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::Clock;

/// A thread-safe cache with TTL support, keyed by query signature.
///
/// Expiry runs off the injected [`Clock`] rather than `Instant` so TTL
/// behavior is deterministic under test. An expired entry is a miss and is
/// removed on the way out; it is never served stale.
pub struct QueryCache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

struct CacheEntry<V> {
    value: V,
    stored_at_ms: i64,
    ttl_ms: i64,
}

impl<V: Clone> QueryCache<V> {
    /// Create a new cache with the given default TTL.
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl,
            clock,
        }
    }

    /// Get a value from the cache. Absent or expired keys are misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if self.clock.now_ms() - entry.stored_at_ms <= entry.ttl_ms {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value in the cache with the default TTL.
    pub fn set(&self, key: String, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Set a value in the cache with a custom TTL.
    pub fn set_with_ttl(&self, key: String, value: V, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                stored_at_ms: self.clock.now_ms(),
                ttl_ms: ttl.as_millis() as i64,
            },
        );
    }

    /// Check if a key exists and is not expired.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a value from the cache.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.data.remove(key).map(|(_, entry)| entry.value)
    }

    /// Remove every entry whose key starts with the given prefix.
    ///
    /// Mutations invalidate all list pages this way, since one mutated
    /// record can shift counts and ordering across pages.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.data.retain(|key, _| !key.starts_with(prefix));
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Remove all expired entries from the cache.
    pub fn cleanup(&self) {
        let now = self.clock.now_ms();
        self.data
            .retain(|_, entry| now - entry.stored_at_ms <= entry.ttl_ms);
    }

    /// Get the number of entries in the cache (including expired).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
