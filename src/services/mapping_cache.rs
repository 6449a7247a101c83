// Resolved-schema cache
//
// Caches resolved tables by handle with LRU eviction and TTL support, so
// repeated queries against the same table handle skip re-resolution. An
// explicit object owned by the table-handle collaborator and passed by
// reference, never process-wide state.

use crate::config::ConnectorConfig;
use crate::models::ResolvedTable;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cached resolution with metadata
#[derive(Debug, Clone)]
struct CachedTable {
    /// None records a table that resolved to nothing (negative caching)
    table: Option<Arc<ResolvedTable>>,
    /// Time when cached
    cached_at: Instant,
    /// Number of times this cache entry was hit
    hit_count: u64,
}

/// LRU entry for tracking access order
#[derive(Debug, Clone)]
struct LruEntry {
    key: String,
    last_accessed: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Resolved-schema cache with LRU eviction and TTL. A zero TTL disables
/// caching entirely. Concurrent first resolutions of the same handle are
/// allowed to race; resolution is pure, so the loser's recomputation is
/// identical and harmless.
pub struct MappingCache {
    cache: Mutex<HashMap<String, CachedTable>>,
    lru_list: Mutex<Vec<LruEntry>>,
    max_size: usize,
    ttl: Duration,
    cache_missing: bool,
    stats: Mutex<CacheStats>,
}

impl MappingCache {
    pub fn new(max_size: usize, ttl: Duration, cache_missing: bool) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            lru_list: Mutex::new(Vec::new()),
            max_size,
            ttl,
            cache_missing,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(
            config.cache.maximum_size,
            Duration::from_secs(config.cache.metadata_ttl_secs),
            config.cache.cache_missing,
        )
    }

    /// Look up a handle. Outer None is a miss; inner None is a cached
    /// negative (the handle is known not to resolve).
    pub fn get(&self, handle_id: &str) -> Option<Option<Arc<ResolvedTable>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut cache = self.cache.lock().unwrap();
        let mut stats = self.stats.lock().unwrap();

        if let Some(cached) = cache.get_mut(handle_id) {
            if cached.cached_at.elapsed() > self.ttl {
                cache.remove(handle_id);
                stats.misses += 1;
                stats.expirations += 1;

                let mut lru = self.lru_list.lock().unwrap();
                lru.retain(|entry| entry.key != handle_id);

                tracing::debug!("Cache expired for handle: {}", handle_id);
                return None;
            }

            cached.hit_count += 1;
            stats.hits += 1;

            let mut lru = self.lru_list.lock().unwrap();
            if let Some(entry) = lru.iter_mut().find(|e| e.key == handle_id) {
                entry.last_accessed = Instant::now();
            }

            tracing::debug!(
                "Cache hit for handle: {} (hit_count: {})",
                handle_id,
                cached.hit_count
            );
            return Some(cached.table.clone());
        }

        stats.misses += 1;
        tracing::debug!("Cache miss for handle: {}", handle_id);
        None
    }

    /// Store a resolved table, returning the shared form callers hold on to.
    pub fn put(&self, table: ResolvedTable) -> Arc<ResolvedTable> {
        let shared = Arc::new(table);
        if self.ttl.is_zero() {
            return shared;
        }
        self.insert(shared.handle.id.clone(), Some(shared.clone()));
        shared
    }

    /// Record that a handle does not resolve, when negative caching is on.
    pub fn put_missing(&self, handle_id: String) {
        if self.ttl.is_zero() || !self.cache_missing {
            return;
        }
        self.insert(handle_id, None);
    }

    fn insert(&self, key: String, table: Option<Arc<ResolvedTable>>) {
        let mut cache = self.cache.lock().unwrap();
        let mut lru = self.lru_list.lock().unwrap();

        if cache.len() >= self.max_size && !cache.contains_key(&key) {
            self.evict_lru(&mut cache, &mut lru);
        }

        cache.insert(
            key.clone(),
            CachedTable { table, cached_at: Instant::now(), hit_count: 0 },
        );
        lru.push(LruEntry { key: key.clone(), last_accessed: Instant::now() });

        tracing::debug!("Cached resolution for handle: {} (cache size: {})", key, cache.len());
    }

    /// Evict least recently used entry
    fn evict_lru(&self, cache: &mut HashMap<String, CachedTable>, lru: &mut Vec<LruEntry>) {
        if lru.is_empty() {
            return;
        }

        lru.sort_by_key(|entry| entry.last_accessed);

        if let Some(oldest) = lru.first() {
            let key_to_remove = oldest.key.clone();
            cache.remove(&key_to_remove);
            lru.remove(0);

            let mut stats = self.stats.lock().unwrap();
            stats.evictions += 1;

            tracing::debug!("Evicted cached handle: {}", key_to_remove);
        }
    }

    /// Drop one handle, e.g. after a DDL change invalidated it.
    pub fn invalidate(&self, handle_id: &str) {
        let mut cache = self.cache.lock().unwrap();
        let mut lru = self.lru_list.lock().unwrap();
        cache.remove(handle_id);
        lru.retain(|entry| entry.key != handle_id);
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap();
        let mut lru = self.lru_list.lock().unwrap();

        let count = cache.len();
        cache.clear();
        lru.clear();

        tracing::debug!("Cleared {} cached handles", count);
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn size(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RemoteColumn, TableHandle};
    use crate::services::resolver::TypeResolver;

    fn resolved_table(schema: &str, table: &str) -> ResolvedTable {
        let resolver = TypeResolver::default();
        let columns = vec![
            RemoteColumn::new("orderkey", "bigint"),
            RemoteColumn::new("comment", "varchar"),
        ];
        resolver.resolve_table(TableHandle::new(schema, table), &columns)
    }

    fn cache(max_size: usize, ttl_secs: u64) -> MappingCache {
        MappingCache::new(max_size, Duration::from_secs(ttl_secs), false)
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = cache(10, 60);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();

        cache.put(table);
        let cached = cache.get(&handle_id).expect("entry should be cached");
        let cached = cached.expect("entry should be a positive resolution");
        assert_eq!(cached.columns.len(), 2);
    }

    #[test]
    fn test_cache_miss() {
        let cache = cache(10, 60);
        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let cache = cache(10, 0);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();
        cache.put(table);
        assert_eq!(cache.size(), 0);
        assert!(cache.get(&handle_id).is_none());
    }

    #[test]
    fn test_cache_expiration() {
        let cache = MappingCache::new(10, Duration::from_millis(50), false);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();
        cache.put(table);

        assert!(cache.get(&handle_id).is_some());

        std::thread::sleep(Duration::from_millis(80));

        assert!(cache.get(&handle_id).is_none());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_negative_caching_is_opt_in() {
        let without = MappingCache::new(10, Duration::from_secs(60), false);
        without.put_missing("gone".to_string());
        assert!(without.get("gone").is_none());

        let with = MappingCache::new(10, Duration::from_secs(60), true);
        with.put_missing("gone".to_string());
        let lookup = with.get("gone").expect("negative entry should be cached");
        assert!(lookup.is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache(2, 60);
        let first = resolved_table("tpch", "orders");
        let first_id = first.handle.id.clone();
        let second = resolved_table("tpch", "nation");
        let second_id = second.handle.id.clone();

        cache.put(first);
        std::thread::sleep(Duration::from_millis(10));
        cache.put(second);
        std::thread::sleep(Duration::from_millis(10));
        cache.put(resolved_table("tpch", "region"));

        assert_eq!(cache.size(), 2);
        assert!(cache.get(&first_id).is_none()); // evicted
        assert!(cache.get(&second_id).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_invalidate_drops_the_handle() {
        let cache = cache(10, 60);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();
        cache.put(table);

        cache.invalidate(&handle_id);
        assert!(cache.get(&handle_id).is_none());
    }

    #[test]
    fn test_shared_resolution_is_the_same_allocation() {
        let cache = cache(10, 60);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();
        let shared = cache.put(table);
        let cached = cache.get(&handle_id).unwrap().unwrap();
        assert!(Arc::ptr_eq(&shared, &cached));
    }

    #[test]
    fn test_cache_stats() {
        let cache = cache(10, 60);
        let table = resolved_table("tpch", "orders");
        let handle_id = table.handle.id.clone();
        cache.put(table);

        cache.get(&handle_id); // hit
        cache.get(&handle_id); // hit
        cache.get("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!(stats.hit_ratio() > 0.6);
    }
}
