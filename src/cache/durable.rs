//! Durable Tier Module
//!
//! The L2 tier is an opaque key/value service addressed by
//! `(namespace, key)`. Records carry the time they were written; TTL is
//! applied by the reader, not the store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

// == Stored Record ==
/// A value as held by the durable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            updated_at: Utc::now(),
        }
    }

    /// Whether the record is younger than `ttl_ms`.
    pub fn is_fresh(&self, ttl_ms: u64) -> bool {
        let age_ms = (Utc::now() - self.updated_at).num_milliseconds();
        age_ms < i64::try_from(ttl_ms).unwrap_or(i64::MAX)
    }

    /// Unix-ms timestamp at which the record stops being fresh.
    pub fn expires_at_ms(&self, ttl_ms: u64) -> u64 {
        let written = u64::try_from(self.updated_at.timestamp_millis()).unwrap_or_default();
        written.saturating_add(ttl_ms)
    }
}

// == Durable Error ==
#[derive(Error, Debug)]
pub enum DurableError {
    #[error("Durable store unavailable: {0}")]
    Unavailable(String),

    #[error("Durable value could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Durable Store Trait ==
/// Backend for the L2 tier.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredRecord>, DurableError>;

    /// Writes `value`, stamping it with the current time.
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), DurableError>;

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), DurableError>;
}

// == Memory Durable Store ==
/// Process-local [`DurableStore`], used when no external store is configured.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    records: RwLock<HashMap<(String, String), StoredRecord>>,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a record as-is, keeping its `updated_at`.
    pub async fn put_record(&self, namespace: &str, key: &str, record: StoredRecord) {
        self.records
            .write()
            .await
            .insert((namespace.to_string(), key.to_string()), record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredRecord>, DurableError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), DurableError> {
        self.put_record(namespace, key, StoredRecord::new(value)).await;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), DurableError> {
        self.records
            .write()
            .await
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}
