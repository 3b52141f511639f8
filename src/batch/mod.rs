//! Batch Module
//!
//! Request coalescing in front of the catalog's fetch-by-ids call.

mod coalescer;

pub use coalescer::{BatchCoalescer, CoalescerStats};
