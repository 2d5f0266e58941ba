//! Keyed in-memory cache with a fixed time-to-live

use crate::entry::{CacheEntry, CacheStats};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// A map of entries that expire `ttl` after being stored.
///
/// Reads hand out clones; the map itself is never exposed. Locks are only
/// held for the map operation, so two callers that miss on the same key both
/// go on to compute the value and the later `set` wins.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Entries expire `ttl` after being stored
    pub fn new(ttl: Duration) -> Self {
        Self::with_ttl(Some(ttl))
    }

    /// Entries never expire; they leave only through invalidation
    pub fn unbounded() -> Self {
        Self::with_ttl(None)
    }

    fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Clone of the value for `key` if present and not expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_valid(self.ttl, now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.data.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write();
            // Another caller may have refreshed the entry in between
            if entries
                .get(key)
                .is_some_and(|entry| !entry.is_valid(self.ttl, now))
            {
                entries.remove(key);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: K, data: V) {
        self.entries.write().insert(key, CacheEntry::new(data));
    }

    /// Drop one entry; returns whether it was present
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries that are still valid
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.is_valid(self.ttl, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_within_ttl() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("k", vec![1, 2, 3]);

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(cache.get(&"k"), Some(vec![1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("k", 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.entries.read().len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_never_expires() {
        let cache = TtlCache::unbounded();
        cache.set((), "tasks");

        tokio::time::advance(Duration::from_secs(7 * 24 * 3600)).await;
        assert_eq!(cache.get(&()), Some("tasks"));
        assert_eq!(cache.ttl(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("k", 1);
        tokio::time::advance(Duration::from_millis(80)).await;
        cache.set("k", 2);
        tokio::time::advance(Duration::from_millis(80)).await;

        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.invalidate(&"a"));
        assert!(!cache.invalidate(&"a"));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.get(&"k"), None);
        cache.set("k", "first");
        cache.set("k", "second");

        assert_eq!(cache.get(&"k"), Some("second"));
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().entries, 1);
    }
}
