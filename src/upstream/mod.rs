//! Upstream Module
//!
//! Client and parser for the external board-game catalog service.

mod client;
pub mod parser;
mod types;

pub use client::{CatalogClient, CatalogClientConfig, HttpCatalogClient, MAX_IDS_PER_CALL};
pub use types::{GameRecord, SearchResult};
