//! Catalog HTTP Client
//!
//! Talks to the external catalog service. Only the two calls this gateway
//! needs are modeled: fetch-by-ids and free-text search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};

use crate::error::{CatalogError, Result};
use crate::upstream::{parser, GameRecord, SearchResult};

/// The catalog rejects "fetch by ids" calls with more ids than this.
pub const MAX_IDS_PER_CALL: usize = 20;

// == Catalog Client Trait ==
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches full records for at most [`MAX_IDS_PER_CALL`] ids.
    ///
    /// Ids the catalog does not know, or whose entries are malformed, are
    /// simply missing from the result.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<GameRecord>>;

    /// Returns every candidate matching `query`, unranked.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

// == Client Config ==
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    pub base_url: String,
    /// Sent as a bearer credential when present
    pub token: Option<String>,
    pub timeout: Duration,
}

// == HTTP Catalog Client ==
pub struct HttpCatalogClient {
    http: ReqwestClient,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalogClient {
    pub fn new(config: CatalogClientConfig) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| CatalogError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    /// Issues a GET and returns the body of a successful response.
    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| CatalogError::Unavailable(format!("catalog request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "catalog returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|err| CatalogError::Unavailable(format!("failed to read catalog response: {err}")))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self), fields(count = ids.len()))]
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_IDS_PER_CALL {
            return Err(CatalogError::InvalidArgument(format!(
                "at most {MAX_IDS_PER_CALL} ids per catalog call, got {}",
                ids.len()
            )));
        }

        let joined = ids.join(",");
        let body = self
            .get_text("thing", &[("id", joined.as_str()), ("type", "boardgame")])
            .await?;
        let games = parser::parse_games(&body)?;
        debug!(requested = ids.len(), parsed = games.len(), "fetched games");
        Ok(games)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let body = self
            .get_text("search", &[("query", query), ("type", "boardgame")])
            .await?;
        parser::parse_search(&body)
    }
}
