//! In-Process Tier Module
//!
//! HashMap storage with insertion-order eviction and TTL expiration. This is
//! the L1 tier of [`TwoLevelCache`](super::TwoLevelCache); all methods are
//! synchronous so callers can hold the guarding mutex for exactly one mutation.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};

// == Memory Store ==
/// Bounded in-process storage with FIFO eviction and TTL support.
#[derive(Debug)]
pub struct MemoryStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Insertion order used for capacity eviction
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL applied to every write
    ttl: Duration,
}

impl<T: Clone> MemoryStore<T> {
    // == Constructor ==
    /// Creates a new MemoryStore with specified capacity and TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
        }
    }

    // == Insert ==
    /// Stores a value expiring one TTL from now.
    ///
    /// Returns the number of entries evicted to restore the capacity bound.
    pub fn insert(&mut self, key: String, value: T) -> usize {
        self.insert_entry(key, CacheEntry::new(value, self.ttl))
    }

    /// Stores a value with an explicit expiration timestamp (Unix ms).
    pub fn insert_until(&mut self, key: String, value: T, expires_at: u64) -> usize {
        self.insert_entry(key, CacheEntry::expiring_at(value, expires_at))
    }

    fn insert_entry(&mut self, key: String, entry: CacheEntry<T>) -> usize {
        match self.entries.insert(key.clone(), entry) {
            None => self.order.push(&key),
            Some(previous) if previous.is_expired() => {
                self.order.remove(&key);
                self.order.push(&key);
            }
            Some(_) => {}
        }

        let mut evicted = 0;
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.order.pop_oldest() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.record_eviction();
            evicted += 1;
        }

        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Get ==
    /// Retrieves a fresh value by key.
    ///
    /// Expired entries are removed. A hit is counted, but a miss is left for
    /// the caller to record since the durable tier may still answer.
    /// Never changes eviction order.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove(key);
        }
        None
    }

    // == Remove ==
    /// Removes an entry by key, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::current_timestamp_ms;
    use std::thread::sleep;

    fn store(max_entries: usize) -> MemoryStore<String> {
        MemoryStore::new(max_entries, Duration::from_secs(300))
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = store(100);

        store.insert("key1".to_string(), "value1".to_string());

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);

        store.insert("key1".to_string(), "value1".to_string());
        store.insert("key1".to_string(), "value2".to_string());

        assert_eq!(store.get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = MemoryStore::new(100, Duration::from_millis(100));

        store.insert("key1".to_string(), 1u32);
        assert_eq!(store.get("key1"), Some(1));

        sleep(Duration::from_millis(150));

        assert_eq!(store.get("key1"), None);
        assert!(!store.contains("key1"), "expired entry should be dropped");
    }

    #[test]
    fn test_store_fifo_eviction() {
        let mut store = store(3);

        store.insert("key1".to_string(), "value1".to_string());
        store.insert("key2".to_string(), "value2".to_string());
        store.insert("key3".to_string(), "value3".to_string());
        let evicted = store.insert("key4".to_string(), "value4".to_string());

        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 3);
        assert!(!store.contains("key1"));
        assert!(store.contains("key2"));
        assert!(store.contains("key4"));
    }

    #[test]
    fn test_store_get_does_not_promote() {
        let mut store = store(3);

        store.insert("key1".to_string(), "value1".to_string());
        store.insert("key2".to_string(), "value2".to_string());
        store.insert("key3".to_string(), "value3".to_string());

        // Reading key1 must not protect it from eviction
        store.get("key1");
        store.insert("key4".to_string(), "value4".to_string());

        assert!(!store.contains("key1"));
        assert!(store.contains("key2"));
    }

    #[test]
    fn test_store_overwrite_keeps_position() {
        let mut store = store(2);

        store.insert("a".to_string(), "1".to_string());
        store.insert("b".to_string(), "2".to_string());
        store.insert("a".to_string(), "3".to_string());
        store.insert("c".to_string(), "4".to_string());

        assert!(!store.contains("a"));
        assert!(store.contains("b"));
        assert!(store.contains("c"));
    }

    #[test]
    fn test_store_rewrite_of_expired_key_moves_to_back() {
        let mut store = store(2);

        store.insert_until("a".to_string(), "1".to_string(), current_timestamp_ms());
        store.insert("b".to_string(), "2".to_string());
        store.insert("a".to_string(), "3".to_string());
        store.insert("c".to_string(), "4".to_string());

        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
    }

    #[test]
    fn test_store_zero_capacity_holds_nothing() {
        let mut store = store(0);

        store.insert("a".to_string(), "1".to_string());

        assert!(store.is_empty());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_insert_until() {
        let mut store = store(10);

        store.insert_until("past".to_string(), "v".to_string(), current_timestamp_ms());
        store.insert_until(
            "future".to_string(),
            "v".to_string(),
            current_timestamp_ms() + 60_000,
        );

        assert_eq!(store.get("past"), None);
        assert_eq!(store.get("future"), Some("v".to_string()));
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = store(100);

        store.insert_until("old".to_string(), "v".to_string(), current_timestamp_ms());
        store.insert("fresh".to_string(), "v".to_string());

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("fresh"));
    }

    #[test]
    fn test_store_remove() {
        let mut store = store(100);

        store.insert("key1".to_string(), "value1".to_string());

        assert!(store.remove("key1"));
        assert!(!store.remove("key1"));
        assert!(store.is_empty());
    }
}
