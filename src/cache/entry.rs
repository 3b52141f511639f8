//! Cache Entry Module
//!
//! Defines the structure for individual in-process cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single in-process cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(value: T, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        Self::expiring_at(value, now.saturating_add(ttl.as_millis() as u64))
    }

    /// Creates a cache entry with an explicit expiration timestamp.
    ///
    /// Used when repopulating from the durable tier, where the remaining
    /// lifetime is derived from the durable record's `updated_at`.
    pub fn expiring_at(value: T, expires_at: u64) -> Self {
        Self {
            value,
            created_at: current_timestamp_ms(),
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is fresh only while the current time is strictly before
    /// `expires_at`; at the boundary it is already expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
