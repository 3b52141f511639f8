//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::batch::CoalescerStats;
use crate::cache::CacheStats;
use crate::service::ServiceStats;
use crate::upstream::{GameRecord, SearchResult};

/// Response body for the lookup operation (POST /games/lookup)
#[derive(Debug, Clone, Serialize)]
pub struct GamesResponse {
    pub games: Vec<GameRecord>,
}

/// Response body for the search operation (GET /search)
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Cache counters plus the derived hit rate
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsView {
    #[serde(flatten)]
    pub counters: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsView {
    fn from(counters: CacheStats) -> Self {
        let hit_rate = counters.hit_rate();
        Self { counters, hit_rate }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub games: CacheStatsView,
    pub searches: CacheStatsView,
    pub batches: CoalescerStats,
}

impl From<ServiceStats> for StatsResponse {
    fn from(stats: ServiceStats) -> Self {
        Self {
            games: stats.games.into(),
            searches: stats.searches.into(),
            batches: stats.batches,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_view_includes_hit_rate() {
        let mut counters = CacheStats::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();
        counters.record_durable_hit();

        let json = serde_json::to_value(CacheStatsView::from(counters)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 2);
        assert_eq!(json["hit_rate"], 0.5);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
