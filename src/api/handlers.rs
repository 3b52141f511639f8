//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::MemoryDurableStore;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::models::{
    GamesResponse, HealthResponse, LookupRequest, SearchParams, SearchResponse, StatsResponse,
};
use crate::service::CatalogService;
use crate::upstream::{CatalogClientConfig, HttpCatalogClient};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CatalogService>,
}

impl AppState {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Builds the HTTP catalog client and an in-process durable tier from
    /// configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpCatalogClient::new(CatalogClientConfig {
            base_url: config.catalog_base_url.clone(),
            token: config.catalog_token.clone(),
            timeout: config.request_timeout(),
        })?;
        let service = CatalogService::new(
            config,
            Arc::new(client),
            Arc::new(MemoryDurableStore::new()),
        );
        Ok(Self::new(service))
    }
}

/// Handler for POST /games/lookup
///
/// Returns the records for the requested ids, in request order.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<GamesResponse>> {
    let ids = req.validate().map_err(CatalogError::InvalidArgument)?;

    let games = state.service.lookup_by_ids(&ids).await?;

    Ok(Json(GamesResponse { games }))
}

/// Handler for GET /search
///
/// Free-text search, best match first.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let query = params.validate().map_err(CatalogError::InvalidArgument)?;

    let results = state
        .service
        .search(query, params.max_results, params.ignore_case.unwrap_or(true))
        .await?;

    Ok(Json(SearchResponse {
        query: query.to_string(),
        results,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{CatalogClient, GameRecord, SearchResult};
    use async_trait::async_trait;

    struct StaticCatalog;

    #[async_trait]
    impl CatalogClient for StaticCatalog {
        async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
            Ok(ids
                .iter()
                .map(|id| GameRecord {
                    id: id.clone(),
                    name: format!("Game {id}"),
                    description: String::new(),
                    image_url: "img".to_string(),
                    min_players: 1,
                    max_players: 2,
                    recommended_players: None,
                    average_play_time: None,
                    min_age: None,
                    genres: Vec::new(),
                })
                .collect())
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            Ok(vec![
                SearchResult::new("2", "Azul: Summer Pavilion"),
                SearchResult::new("1", "Azul"),
            ])
        }
    }

    fn state() -> AppState {
        let config = Config {
            batch_delay_ms: 0,
            ..Config::default()
        };
        AppState::new(CatalogService::new(
            &config,
            Arc::new(StaticCatalog),
            Arc::new(MemoryDurableStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_lookup_handler() {
        let req: LookupRequest = serde_json::from_str(r#"{"ids": ["5", "6"]}"#).unwrap();

        let response = lookup_handler(State(state()), Json(req)).await.unwrap();

        assert_eq!(response.games.len(), 2);
        assert_eq!(response.games[0].id, "5");
    }

    #[tokio::test]
    async fn test_lookup_handler_invalid_ids() {
        let req: LookupRequest = serde_json::from_str(r#"{"ids": "5"}"#).unwrap();

        let result = lookup_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_search_handler() {
        let params = SearchParams {
            query: Some("azul".to_string()),
            ..SearchParams::default()
        };

        let response = search_handler(State(state()), Query(params)).await.unwrap();

        assert_eq!(response.query, "azul");
        assert_eq!(response.results[0].name, "Azul");
    }

    #[tokio::test]
    async fn test_search_handler_missing_query() {
        let result = search_handler(State(state()), Query(SearchParams::default())).await;
        assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.games.counters.hits, 0);
        assert_eq!(response.batches.batches_dispatched, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
