//! Lookup result caching keyed by normalized prefix

use super::lookup::LookupResult;
use crate::prefix::NormalizedPrefix;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Default maximum number of cached prefixes
pub const DEFAULT_CACHE_SIZE: usize = 1000;

#[derive(Debug)]
struct Slot {
    cell: Arc<OnceCell<LookupResult>>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<NormalizedPrefix, Slot>,
    // last_used tick -> key, oldest first
    recency: BTreeMap<u64, NormalizedPrefix>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &NormalizedPrefix) -> Option<Arc<OnceCell<LookupResult>>> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.last_used);
        slot.last_used = tick;
        self.recency.insert(tick, key.clone());
        Some(Arc::clone(&slot.cell))
    }

    fn insert(&mut self, key: NormalizedPrefix, cell: Arc<OnceCell<LookupResult>>, capacity: usize) {
        let tick = self.next_tick();
        if let Some(old) = self.entries.insert(
            key.clone(),
            Slot {
                cell,
                last_used: tick,
            },
        ) {
            self.recency.remove(&old.last_used);
        }
        self.recency.insert(tick, key);

        while self.entries.len() > capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// Thread-safe LRU cache of lookup results.
///
/// Concurrent requests for the same prefix share one computation: the first
/// caller runs it and the rest wait for its result. An entry evicted while
/// its computation is still running is finished for the callers already
/// waiting on it, and a later request starts a fresh one.
#[derive(Debug)]
pub struct LookupCache {
    state: Mutex<CacheState>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCache {
    /// Create a cache holding at most `capacity` prefixes (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached result for `key`, computing it at most once.
    ///
    /// Failed lookups are cached like successful ones, since failures are
    /// carried inside [`LookupResult`].
    pub async fn get_or_compute<F, Fut>(&self, key: &NormalizedPrefix, compute: F) -> LookupResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupResult>,
    {
        let cell = self.slot(key);
        cell.get_or_init(compute).await.clone()
    }

    fn slot(&self, key: &NormalizedPrefix) -> Arc<OnceCell<LookupResult>> {
        let mut state = self.state.lock().expect("mutex poisoned");
        if let Some(cell) = state.touch(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cell;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(OnceCell::new());
        state.insert(key.clone(), Arc::clone(&cell), self.capacity);
        cell
    }

    /// Look up a finished result, marking it as recently used
    pub fn get(&self, key: &NormalizedPrefix) -> Option<LookupResult> {
        let mut state = self.state.lock().expect("mutex poisoned");
        let cell = state.touch(key)?;
        let result = cell.get().cloned();
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Store a result directly, replacing any existing entry
    pub fn insert(&self, key: NormalizedPrefix, result: LookupResult) {
        let cell = Arc::new(OnceCell::new_with(Some(result)));
        let mut state = self.state.lock().expect("mutex poisoned");
        state.insert(key, cell, self.capacity);
    }

    /// Check whether a prefix has an entry, without touching its recency
    pub fn contains(&self, key: &NormalizedPrefix) -> bool {
        let state = self.state.lock().expect("mutex poisoned");
        state.entries.contains_key(key)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("mutex poisoned");
        state.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("mutex poisoned");
        state.entries.clear();
        state.recency.clear();
    }

    /// Snapshot of size and hit counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Statistics about the lookup cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in the cache
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Requests answered by an existing entry
    pub hits: u64,
    /// Requests that created a new entry
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::{normalize, RawPrefix};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn key(s: &str) -> NormalizedPrefix {
        normalize(&RawPrefix::from(s)).unwrap()
    }

    fn result(asn: &str) -> LookupResult {
        LookupResult::new(asn, format!("AS{asn} Provider"))
    }

    #[test]
    fn test_lookup_cache() {
        let cache = LookupCache::new(10);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 10);

        cache.insert(key("104.16.0.0/12"), result("13335"));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key("104.16.0.0/12")));

        let found = cache.get(&key("104.16.0.0/12"));
        assert_eq!(found.unwrap().asn, "13335");
        assert!(cache.get(&key("8.8.8.8")).is_none());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = LookupCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(key("1.1.1.1"), result("13335"));
        cache.insert(key("8.8.8.8"), result("15169"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_bounds_size() {
        let cache = LookupCache::new(5);
        for i in 0..50 {
            cache.insert(key(&format!("10.0.{i}.0/24")), result("64500"));
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.len(), 5);
        // Only the newest five survive
        assert!(cache.contains(&key("10.0.49.0/24")));
        assert!(!cache.contains(&key("10.0.0.0/24")));
    }

    #[test]
    fn test_eviction_is_least_recently_used() {
        let cache = LookupCache::new(2);
        cache.insert(key("1.1.1.1"), result("13335"));
        cache.insert(key("8.8.8.8"), result("15169"));

        // Touch the older entry so 8.8.8.8 becomes the eviction candidate
        assert!(cache.get(&key("1.1.1.1")).is_some());
        cache.insert(key("9.9.9.9"), result("19281"));

        assert!(cache.contains(&key("1.1.1.1")));
        assert!(!cache.contains(&key("8.8.8.8")));
        assert!(cache.contains(&key("9.9.9.9")));
    }

    #[tokio::test]
    async fn test_get_or_compute_memoizes() {
        let cache = LookupCache::new(10);
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            let value = cache
                .get_or_compute(&key("8.8.8.8"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    result("15169")
                })
                .await;
            assert_eq!(value.asn, "15169");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_errors_are_cached() {
        let cache = LookupCache::new(10);
        let calls = AtomicUsize::new(0);
        let err = LookupResult::new("N/A", "Error: boom");

        for _ in 0..3 {
            let value = cache
                .get_or_compute(&key("bad/99"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    err.clone()
                })
                .await;
            assert!(value.is_error());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_single_flight() {
        let cache = Arc::new(LookupCache::new(10));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(&key("1.1.1.0/24"), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        result("13335")
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), result("13335"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
