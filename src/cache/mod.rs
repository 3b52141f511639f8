//! Cache Module
//!
//! Two-level caching: a bounded in-process tier with TTL expiration and
//! insertion-order eviction, backed by a durable key/value tier.

mod durable;
mod entry;
mod memory;
mod order;
mod stats;
mod tiered;


// Re-export public types
pub use durable::{DurableError, DurableStore, MemoryDurableStore, StoredRecord};
pub use entry::CacheEntry;
pub use memory::MemoryStore;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use tiered::TwoLevelCache;

// == Public Constants ==
/// Durable-tier namespace for game records
pub const GAMES_NAMESPACE: &str = "games";

/// Durable-tier namespace for ranked search results
pub const SEARCH_NAMESPACE: &str = "searches";
