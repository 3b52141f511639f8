//! Two-Level Cache Module
//!
//! Combines the in-process [`MemoryStore`] (L1) with a [`DurableStore`] (L2).
//! Durable-tier failures are logged and absorbed: a broken L2 degrades the
//! cache to L1-only, it never fails the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheStats, DurableStore, MemoryStore};

// == Two Level Cache ==
pub struct TwoLevelCache<T> {
    /// Namespace under which values are written to the durable tier
    namespace: String,
    ttl: Duration,
    memory: Mutex<MemoryStore<T>>,
    durable: Arc<dyn DurableStore>,
}

impl<T> TwoLevelCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a cache writing through to `durable` under `namespace`.
    pub fn new(
        namespace: impl Into<String>,
        max_entries: usize,
        ttl: Duration,
        durable: Arc<dyn DurableStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            memory: Mutex::new(MemoryStore::new(max_entries, ttl)),
            durable,
        }
    }

    // The guard is only ever held for one synchronous mutation.
    fn memory(&self) -> MutexGuard<'_, MemoryStore<T>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }

    // == Get ==
    /// Returns the fresh value for `key`, consulting L1 then L2.
    pub async fn get(&self, key: &str) -> Option<T> {
        if let Some(value) = self.memory().get(key) {
            debug!(namespace = %self.namespace, key, "memory hit");
            return Some(value);
        }

        let record = match self.durable.get(&self.namespace, key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.memory().stats_mut().record_miss();
                return None;
            }
            Err(err) => {
                warn!(namespace = %self.namespace, key, error = %err, "durable read failed, treating as miss");
                let mut memory = self.memory();
                memory.stats_mut().record_durable_error();
                memory.stats_mut().record_miss();
                return None;
            }
        };

        if !record.is_fresh(self.ttl_ms()) {
            debug!(namespace = %self.namespace, key, "durable entry is stale");
            self.memory().stats_mut().record_miss();
            if let Err(err) = self.durable.delete(&self.namespace, key).await {
                warn!(namespace = %self.namespace, key, error = %err, "failed to delete stale durable entry");
                self.memory().stats_mut().record_durable_error();
            }
            return None;
        }

        let expires_at = record.expires_at_ms(self.ttl_ms());
        match serde_json::from_value::<T>(record.value) {
            Ok(value) => {
                debug!(namespace = %self.namespace, key, "durable hit");
                let mut memory = self.memory();
                memory.insert_until(key.to_string(), value.clone(), expires_at);
                memory.stats_mut().record_durable_hit();
                Some(value)
            }
            Err(err) => {
                warn!(namespace = %self.namespace, key, error = %err, "undecodable durable entry, treating as miss");
                let mut memory = self.memory();
                memory.stats_mut().record_durable_error();
                memory.stats_mut().record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Writes `value` to L1 and through to L2.
    pub async fn set(&self, key: &str, value: T) {
        let encoded = serde_json::to_value(&value);

        let evicted = self.memory().insert(key.to_string(), value);
        if evicted > 0 {
            debug!(namespace = %self.namespace, evicted, "evicted earliest-inserted entries");
        }

        let result = match encoded {
            Ok(json) => self.durable.set(&self.namespace, key, json).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(namespace = %self.namespace, key, error = %err, "durable write failed");
            self.memory().stats_mut().record_durable_error();
        }
    }

    // == Maintenance ==
    /// Drops expired in-process entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.memory().cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.memory().stats()
    }

    /// Number of entries currently held in-process.
    pub fn memory_len(&self) -> usize {
        self.memory().len()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
