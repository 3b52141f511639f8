//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default catalog endpoint (BoardGameGeek XML API v2)
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://boardgamegeek.com/xmlapi2";

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the catalog service
    pub catalog_base_url: String,
    /// Optional bearer token sent to the catalog service
    pub catalog_token: Option<String>,
    /// Timeout in seconds for a single catalog request
    pub request_timeout: u64,
    /// Maximum number of in-process entries per cache
    pub max_entries: usize,
    /// TTL in seconds for cached game records
    pub game_ttl: u64,
    /// TTL in seconds for cached search results
    pub search_ttl: u64,
    /// Debounce delay in milliseconds before a pending batch is dispatched
    pub batch_delay_ms: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CATALOG_BASE_URL` - Catalog service base URL (default: BoardGameGeek XML API v2)
    /// - `CATALOG_TOKEN` - Optional bearer token (default: none)
    /// - `REQUEST_TIMEOUT` - Catalog request timeout in seconds (default: 10)
    /// - `MAX_ENTRIES` - Maximum in-process entries per cache (default: 1000)
    /// - `GAME_TTL` - Game record TTL in seconds (default: 86400)
    /// - `SEARCH_TTL` - Search result TTL in seconds (default: 3600)
    /// - `BATCH_DELAY_MS` - Batch debounce delay in milliseconds (default: 50)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            catalog_base_url: env::var("CATALOG_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.catalog_base_url),
            catalog_token: env::var("CATALOG_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            request_timeout: parse_var("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            game_ttl: parse_var("GAME_TTL").unwrap_or(defaults.game_ttl),
            search_ttl: parse_var("SEARCH_TTL").unwrap_or(defaults.search_ttl),
            batch_delay_ms: parse_var("BATCH_DELAY_MS").unwrap_or(defaults.batch_delay_ms),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    pub fn game_ttl(&self) -> Duration {
        Duration::from_secs(self.game_ttl)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            catalog_token: None,
            request_timeout: 10,
            max_entries: 1000,
            game_ttl: 86_400,
            search_ttl: 3_600,
            batch_delay_ms: 50,
            cleanup_interval: 60,
        }
    }
}
