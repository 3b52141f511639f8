//! Catalog Cache - a resource-conserving gateway to a board-game catalog
//!
//! Fronts a slow, rate-limited catalog service with a two-level cache and a
//! request-coalescing batch fetcher.

pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod ranking;
pub mod service;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::{CatalogError, Result};
pub use service::CatalogService;
pub use tasks::spawn_cleanup_task;
