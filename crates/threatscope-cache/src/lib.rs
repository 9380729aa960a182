//! ThreatScope Cache - TTL-based memoization for analysis results
//!
//! The correlation engine and the risk scorer memoize derived results
//! keyed by a stable hash of input identity. The default store is a
//! single-process in-memory map; the `Store` trait is the seam for
//! swapping in an external backend in multi-process deployments. An
//! adapter whose backend is unavailable must log a warning and behave
//! as a permanent miss rather than failing the request.

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Stable cache key derived from input identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Derive a key from a scope, a primary id, and a set of related ids
    ///
    /// Related ids are sorted before hashing so the key is independent
    /// of input list ordering.
    pub fn compute<I, S>(scope: &str, primary: &str, related_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids: Vec<String> = related_ids
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        ids.sort();
        ids.dedup();

        let mut hasher = DefaultHasher::new();
        scope.hash(&mut hasher);
        primary.hash(&mut hasher);
        for id in &ids {
            id.hash(&mut hasher);
        }
        CacheKey(hasher.finish())
    }

    /// Render the key the way it appears in logs
    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

/// Entry counts and hit/miss statistics for one cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache name
    pub name: String,
    /// Live (non-stale) entries
    pub entries: usize,
    /// Lookup hits since creation or last clear
    pub hits: u64,
    /// Lookup misses since creation or last clear
    pub misses: u64,
}

/// Storage abstraction for memoized analysis results
pub trait Store<V: Clone>: Send + Sync {
    /// Look up a value; stale entries behave as absent
    fn get(&self, key: CacheKey) -> Option<V>;

    /// Write a value through
    fn put(&self, key: CacheKey, value: V);

    /// Drop all entries
    fn clear(&self);

    /// Report entry counts and hit/miss statistics
    fn stats(&self) -> CacheStats;

    /// Look up a value, computing and writing it through on a miss
    ///
    /// The default is check-then-compute without holding any lock, so
    /// two concurrent callers may both compute (best effort, not
    /// exactly-once). `TtlCache` overrides this with the lock held.
    fn get_or_insert_with(&self, key: CacheKey, compute: &dyn Fn() -> V) -> V {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = compute();
        self.put(key, value.clone());
        value
    }
}

struct Entry<V> {
    value: V,
    created: Instant,
}

/// Default in-memory TTL map
pub struct TtlCache<V> {
    name: String,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Create a named cache with the given entry lifetime
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a named cache with the default TTL
    pub fn with_default_ttl(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_TTL)
    }

    fn is_stale(&self, entry: &Entry<V>) -> bool {
        entry.created.elapsed() > self.ttl
    }
}

impl<V: Clone + Send + Sync> Store<V> for TtlCache<V> {
    fn get(&self, key: CacheKey) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if !self.is_stale(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                // Stale entries are evicted on access
                entries.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, value: V) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            Entry {
                value,
                created: Instant::now(),
            },
        );
    }

    fn clear(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        debug!(cache = %self.name, dropped, "cache cleared");
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let live = entries.values().filter(|e| !self.is_stale(e)).count();
        CacheStats {
            name: self.name.clone(),
            entries: live,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Read-check-write under one lock so concurrent callers do not
    /// recompute the same key
    fn get_or_insert_with(&self, key: CacheKey, compute: &dyn Fn() -> V) -> V {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            if !self.is_stale(entry) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.value.clone();
            }
            entries.remove(&key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                created: Instant::now(),
            },
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let a = CacheKey::compute("correlation", "CVE-2024-1234", ["t1", "t2", "t3"]);
        let b = CacheKey::compute("correlation", "CVE-2024-1234", ["t3", "t1", "t2"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_varies_with_identity() {
        let a = CacheKey::compute("correlation", "CVE-2024-1234", ["t1"]);
        let b = CacheKey::compute("correlation", "CVE-2024-9999", ["t1"]);
        let c = CacheKey::compute("risk", "CVE-2024-1234", ["t1"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_get_put_roundtrip() {
        let cache: TtlCache<String> = TtlCache::with_default_ttl("test");
        let key = CacheKey::compute("test", "k1", Vec::<&str>::new());

        assert_eq!(cache.get(key), None);
        cache.put(key, "value".into());
        assert_eq!(cache.get(key), Some("value".into()));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_stats_grow_by_distinct_keys() {
        let cache: TtlCache<u32> = TtlCache::with_default_ttl("test");
        let key = CacheKey::compute("test", "k1", Vec::<&str>::new());

        cache.get_or_insert_with(key, &|| 7);
        cache.get_or_insert_with(key, &|| 7);
        cache.get_or_insert_with(key, &|| 7);

        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_stale_entries_behave_as_absent() {
        let cache: TtlCache<u32> = TtlCache::new("test", Duration::from_secs(0));
        let key = CacheKey::compute("test", "k1", Vec::<&str>::new());

        cache.put(key, 42);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(key), None);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let cache: TtlCache<u32> = TtlCache::with_default_ttl("test");
        for i in 0..4 {
            cache.put(CacheKey::compute("test", &format!("k{}", i), Vec::<&str>::new()), i);
        }
        assert_eq!(cache.stats().entries, 4);
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        use std::cell::Cell;

        let cache: TtlCache<u32> = TtlCache::with_default_ttl("test");
        let key = CacheKey::compute("test", "k1", Vec::<&str>::new());
        let calls = Cell::new(0u32);

        let compute = || {
            calls.set(calls.get() + 1);
            11
        };
        assert_eq!(cache.get_or_insert_with(key, &compute), 11);
        assert_eq!(cache.get_or_insert_with(key, &compute), 11);
        assert_eq!(calls.get(), 1);
    }
}
