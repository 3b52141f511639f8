//! Catalog Service
//!
//! The two entry points external callers use: batched lookup by id and
//! free-text search. Both are served from the two-level cache when possible
//! and fall back to the catalog (through the coalescer for lookups).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::batch::{BatchCoalescer, CoalescerStats};
use crate::cache::{CacheStats, DurableStore, TwoLevelCache, GAMES_NAMESPACE, SEARCH_NAMESPACE};
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::ranking::rank;
use crate::upstream::{CatalogClient, GameRecord, SearchResult, MAX_IDS_PER_CALL};

/// Results returned by search when the caller does not ask for a count.
pub const DEFAULT_SEARCH_RESULTS: usize = 20;
/// Upper bound on results returned by a single search.
pub const MAX_SEARCH_RESULTS: usize = 50;

// == Service Stats ==
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub games: CacheStats,
    pub searches: CacheStats,
    pub batches: CoalescerStats,
}

// == Catalog Service ==
pub struct CatalogService {
    client: Arc<dyn CatalogClient>,
    games: Arc<TwoLevelCache<GameRecord>>,
    searches: TwoLevelCache<Vec<SearchResult>>,
    coalescer: BatchCoalescer,
}

impl CatalogService {
    pub fn new(
        config: &Config,
        client: Arc<dyn CatalogClient>,
        durable: Arc<dyn DurableStore>,
    ) -> Self {
        let games = Arc::new(TwoLevelCache::new(
            GAMES_NAMESPACE,
            config.max_entries,
            config.game_ttl(),
            durable.clone(),
        ));
        let searches = TwoLevelCache::new(
            SEARCH_NAMESPACE,
            config.max_entries,
            config.search_ttl(),
            durable,
        );
        let coalescer = BatchCoalescer::new(client.clone(), games.clone(), config.batch_delay());

        Self {
            client,
            games,
            searches,
            coalescer,
        }
    }

    // == Lookup By Ids ==
    /// Returns the records for `ids` in input order.
    ///
    /// Ids are deduplicated and capped at [`MAX_IDS_PER_CALL`]. Ids the
    /// catalog does not know are omitted. If fetching any cache miss fails,
    /// the whole call fails and cached hits are not returned.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn lookup_by_ids(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
        if ids.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "ids must be a non-empty list".to_string(),
            ));
        }
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(CatalogError::InvalidArgument(
                "ids must not be blank".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let wanted: Vec<String> = ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| seen.insert(id.clone()))
            .take(MAX_IDS_PER_CALL)
            .collect();

        let mut found: HashMap<String, GameRecord> = HashMap::new();
        let mut missing = Vec::new();
        for id in &wanted {
            match self.games.get(id).await {
                Some(game) => {
                    found.insert(id.clone(), game);
                }
                None => missing.push(id.clone()),
            }
        }
        debug!(hits = found.len(), misses = missing.len(), "game cache lookup");

        if !missing.is_empty() {
            let fetched = self.coalescer.load(missing).await?;
            found.extend(fetched);
        }

        Ok(wanted
            .iter()
            .filter_map(|id| found.remove(id))
            .collect())
    }

    // == Search ==
    /// Returns up to `max_results` candidates for `query`, best match first.
    ///
    /// The full ranked candidate list is cached, keyed by the normalized
    /// query, case sensitivity and requested count.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
        ignore_case: bool,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "query must not be blank".to_string(),
            ));
        }
        let max_results = max_results
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .min(MAX_SEARCH_RESULTS);
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let key = search_key(query, ignore_case, max_results);
        if let Some(ranked) = self.searches.get(&key).await {
            debug!(key, "search cache hit");
            return Ok(truncated(ranked, max_results));
        }

        let candidates = self.client.search(query).await?;
        let ranked = rank(candidates, query, ignore_case);
        debug!(key, candidates = ranked.len(), "ranked search candidates");
        self.searches.set(&key, ranked.clone()).await;

        Ok(truncated(ranked, max_results))
    }

    // == Maintenance ==
    /// Drops expired in-process entries from both caches.
    pub fn purge_expired(&self) -> usize {
        self.games.purge_expired() + self.searches.purge_expired()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            games: self.games.stats(),
            searches: self.searches.stats(),
            batches: self.coalescer.stats(),
        }
    }
}

fn search_key(query: &str, ignore_case: bool, max_results: usize) -> String {
    let normalized = if ignore_case {
        query.to_lowercase()
    } else {
        query.to_string()
    };
    format!("{normalized}|{ignore_case}|{max_results}")
}

fn truncated(mut results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    results.truncate(max_results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryDurableStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct FakeCatalog {
        fetches: AtomicUsize,
        searches: AtomicUsize,
        fail_fetch: AtomicBool,
        candidates: Vec<SearchResult>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(CatalogError::Unavailable("catalog returned 500".into()));
            }
            Ok(ids
                .iter()
                .filter(|id| id.as_str() != "404")
                .map(|id| game(id))
                .collect())
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    fn game(id: &str) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            name: format!("Game {id}"),
            description: String::new(),
            image_url: "img".to_string(),
            min_players: 2,
            max_players: 4,
            recommended_players: None,
            average_play_time: None,
            min_age: None,
            genres: Vec::new(),
        }
    }

    fn service(catalog: Arc<FakeCatalog>) -> CatalogService {
        let config = Config {
            batch_delay_ms: 10,
            ..Config::default()
        };
        CatalogService::new(&config, catalog, Arc::new(MemoryDurableStore::new()))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lookup_preserves_input_order_and_omits_unknown() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service(catalog);

        let games = assert_ok!(service.lookup_by_ids(&strings(&["3", "404", "1", "3"])).await);

        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn test_repeated_lookup_is_served_from_cache() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service(catalog.clone());

        assert_ok!(service.lookup_by_ids(&strings(&["1", "2"])).await);
        assert_ok!(service.lookup_by_ids(&strings(&["2", "1"])).await);

        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_rejects_empty_and_blank_ids() {
        let service = service(Arc::new(FakeCatalog::default()));

        let err = assert_err!(service.lookup_by_ids(&[]).await);
        assert!(matches!(err, CatalogError::InvalidArgument(_)));

        let err = assert_err!(service.lookup_by_ids(&strings(&["1", "  "])).await);
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_lookup_caps_at_upstream_limit() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service(catalog.clone());
        let ids: Vec<String> = (0..30).map(|i| i.to_string()).collect();

        let games = assert_ok!(service.lookup_by_ids(&ids).await);

        assert_eq!(games.len(), MAX_IDS_PER_CALL);
        assert_eq!(games[0].id, "0");
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_discards_cached_hits() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service(catalog.clone());

        assert_ok!(service.lookup_by_ids(&strings(&["1"])).await);
        catalog.fail_fetch.store(true, Ordering::SeqCst);

        let err = assert_err!(service.lookup_by_ids(&strings(&["1", "2"])).await);
        assert!(matches!(err, CatalogError::Unavailable(_)));

        // Cached hits alone still succeed
        let games = assert_ok!(service.lookup_by_ids(&strings(&["1"])).await);
        assert_eq!(games.len(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_and_truncates() {
        let catalog = Arc::new(FakeCatalog {
            candidates: vec![
                SearchResult::new("1", "Monopoly Arena"),
                SearchResult::new("2", "Mono"),
                SearchResult::new("3", "Monopoly"),
            ],
            ..FakeCatalog::default()
        });
        let service = service(catalog);

        let results = assert_ok!(service.search("mono", Some(2), true).await);

        assert_eq!(
            results,
            vec![SearchResult::new("2", "Mono"), SearchResult::new("3", "Monopoly")]
        );
    }

    #[tokio::test]
    async fn test_search_caches_full_ranked_list() {
        let candidates: Vec<SearchResult> = (0..60)
            .map(|i| SearchResult::new(i.to_string(), format!("Catan {i}")))
            .collect();
        let catalog = Arc::new(FakeCatalog {
            candidates,
            ..FakeCatalog::default()
        });
        let service = service(catalog.clone());

        let first = assert_ok!(service.search("Catan", None, true).await);
        let second = assert_ok!(service.search("  catan ", None, true).await);

        assert_eq!(first.len(), DEFAULT_SEARCH_RESULTS);
        assert_eq!(first, second);
        assert_eq!(catalog.searches.load(Ordering::SeqCst), 1);

        let stats = service.stats();
        assert_eq!(stats.searches.hits, 1);
    }

    #[tokio::test]
    async fn test_search_caps_results_and_rejects_blank_query() {
        let candidates: Vec<SearchResult> = (0..80)
            .map(|i| SearchResult::new(i.to_string(), format!("Risk {i}")))
            .collect();
        let service = service(Arc::new(FakeCatalog {
            candidates,
            ..FakeCatalog::default()
        }));

        let results = assert_ok!(service.search("risk", Some(500), true).await);
        assert_eq!(results.len(), MAX_SEARCH_RESULTS);

        let err = assert_err!(service.search("   ", None, true).await);
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_search_zero_results_is_empty_without_catalog_call() {
        let catalog = Arc::new(FakeCatalog {
            candidates: vec![SearchResult::new("1", "Risk")],
            ..FakeCatalog::default()
        });
        let service = service(catalog.clone());

        let results = assert_ok!(service.search("risk", Some(0), true).await);

        assert!(results.is_empty());
        assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_search_key_normalization() {
        assert_eq!(search_key("Catan", true, 20), "catan|true|20");
        assert_eq!(search_key("Catan", false, 20), "Catan|false|20");
        assert_ne!(search_key("catan", true, 10), search_key("catan", true, 20));
    }
}
