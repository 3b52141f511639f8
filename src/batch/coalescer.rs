//! Batch Coalescer
//!
//! Merges concurrent lookups for possibly-overlapping ids into as few
//! catalog calls as possible. Each open batch holds at most
//! [`MAX_IDS_PER_CALL`] ids and fires once after a debounce delay; every
//! caller attached to it receives exactly the records it asked for.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::cache::TwoLevelCache;
use crate::error::{CatalogError, Result};
use crate::upstream::{CatalogClient, GameRecord, MAX_IDS_PER_CALL};

type Fulfilment = Result<HashMap<String, GameRecord>>;

// == Pending Batch ==
struct Requester {
    requested: HashSet<String>,
    reply: oneshot::Sender<Fulfilment>,
}

struct PendingBatch {
    id: u64,
    /// Ids to fetch, in admission order, never more than MAX_IDS_PER_CALL
    ids: Vec<String>,
    requesters: Vec<Requester>,
}

impl PendingBatch {
    fn new(id: u64) -> Self {
        Self {
            id,
            ids: Vec::new(),
            requesters: Vec::new(),
        }
    }

    fn free_capacity(&self) -> usize {
        MAX_IDS_PER_CALL.saturating_sub(self.ids.len())
    }

    /// Registers a requester for `requested`, all of which must already be in `ids`.
    fn attach(&mut self, requested: Vec<String>) -> oneshot::Receiver<Fulfilment> {
        let (reply, receiver) = oneshot::channel();
        self.requesters.push(Requester {
            requested: requested.into_iter().collect(),
            reply,
        });
        receiver
    }
}

#[derive(Default)]
struct Registry {
    next_batch_id: u64,
    /// Open batches in creation order
    open: Vec<PendingBatch>,
}

// == Coalescer Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoalescerStats {
    /// Catalog calls issued
    pub batches_dispatched: u64,
    /// Catalog calls that failed
    pub batches_failed: u64,
    /// Ids sent to the catalog across all calls
    pub ids_fetched: u64,
    /// Batches currently accepting ids
    pub open_batches: usize,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    failed: AtomicU64,
    ids_fetched: AtomicU64,
}

// == Batch Coalescer ==
pub struct BatchCoalescer {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn CatalogClient>,
    cache: Arc<TwoLevelCache<GameRecord>>,
    delay: Duration,
    registry: Mutex<Registry>,
    counters: Counters,
}

impl BatchCoalescer {
    /// Creates a coalescer that fetches through `client` and stores every
    /// fetched record in `cache`. Batches fire `delay` after they open.
    pub fn new(
        client: Arc<dyn CatalogClient>,
        cache: Arc<TwoLevelCache<GameRecord>>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                cache,
                delay,
                registry: Mutex::new(Registry::default()),
                counters: Counters::default(),
            }),
        }
    }

    // == Load ==
    /// Resolves `ids` through the shared batches.
    ///
    /// Ids the catalog does not return are absent from the map. If any batch
    /// this call was attached to fails, the whole call fails with that error.
    pub async fn load(&self, ids: Vec<String>) -> Result<HashMap<String, GameRecord>> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let replies = self.admit(ids);
        let parts = try_join_all(replies.into_iter().map(|reply| async move {
            reply.await.map_err(|_| {
                CatalogError::Internal("batch was dropped before completing".to_string())
            })?
        }))
        .await?;

        let mut merged = HashMap::new();
        for part in parts {
            merged.extend(part);
        }
        Ok(merged)
    }

    /// Attaches `remaining` to open batches, opening new ones for the rest.
    fn admit(&self, mut remaining: Vec<String>) -> Vec<oneshot::Receiver<Fulfilment>> {
        let mut replies = Vec::new();
        let mut opened = Vec::new();

        {
            let mut registry = self.inner.registry();

            for batch in registry.open.iter_mut() {
                if remaining.is_empty() {
                    break;
                }

                // Ids already being fetched cost no capacity.
                let mut claimed = Vec::new();
                remaining.retain(|id| {
                    if batch.ids.contains(id) {
                        claimed.push(id.clone());
                        false
                    } else {
                        true
                    }
                });

                let take = batch.free_capacity().min(remaining.len());
                for id in remaining.drain(..take) {
                    batch.ids.push(id.clone());
                    claimed.push(id);
                }

                if !claimed.is_empty() {
                    debug!(batch = batch.id, joined = claimed.len(), "joined open batch");
                    replies.push(batch.attach(claimed));
                }
            }

            while !remaining.is_empty() {
                let take = remaining.len().min(MAX_IDS_PER_CALL);
                let chunk: Vec<String> = remaining.drain(..take).collect();

                let batch_id = registry.next_batch_id;
                registry.next_batch_id += 1;

                let mut batch = PendingBatch::new(batch_id);
                batch.ids.extend(chunk.iter().cloned());
                replies.push(batch.attach(chunk));
                registry.open.push(batch);

                debug!(batch = batch_id, "opened batch");
                opened.push(batch_id);
            }
        }

        for batch_id in opened {
            self.schedule(batch_id);
        }
        replies
    }

    fn schedule(&self, batch_id: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.fire(batch_id).await;
        });
    }

    pub fn stats(&self) -> CoalescerStats {
        let counters = &self.inner.counters;
        CoalescerStats {
            batches_dispatched: counters.dispatched.load(Ordering::Relaxed),
            batches_failed: counters.failed.load(Ordering::Relaxed),
            ids_fetched: counters.ids_fetched.load(Ordering::Relaxed),
            open_batches: self.inner.registry().open.len(),
        }
    }
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the batch from the registry so no further ids can join it.
    fn detach(&self, batch_id: u64) -> Option<PendingBatch> {
        let mut registry = self.registry();
        let position = registry.open.iter().position(|b| b.id == batch_id)?;
        Some(registry.open.remove(position))
    }

    async fn fire(&self, batch_id: u64) {
        // Detach strictly before the first suspension point.
        let Some(batch) = self.detach(batch_id) else {
            return;
        };

        info!(
            batch = batch.id,
            ids = batch.ids.len(),
            requesters = batch.requesters.len(),
            "dispatching batch"
        );
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        self.counters
            .ids_fetched
            .fetch_add(batch.ids.len() as u64, Ordering::Relaxed);

        match self.client.fetch_by_ids(&batch.ids).await {
            Ok(games) => {
                let mut by_id = HashMap::with_capacity(games.len());
                for game in games {
                    self.cache.set(&game.id, game.clone()).await;
                    by_id.insert(game.id.clone(), game);
                }

                for requester in batch.requesters {
                    let subset: HashMap<String, GameRecord> = requester
                        .requested
                        .iter()
                        .filter_map(|id| by_id.get(id).map(|game| (id.clone(), game.clone())))
                        .collect();
                    // A dropped receiver means the caller stopped waiting.
                    let _ = requester.reply.send(Ok(subset));
                }
            }
            Err(err) => {
                error!(batch = batch.id, error = %err, "batch fetch failed");
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                for requester in batch.requesters {
                    let _ = requester.reply.send(Err(err.clone()));
                }
            }
        }
    }
}
