use crate::error::Result;
use crate::models::ProxyRecord;
use crate::repository::ProxyStore;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Draws ranked batches from the store, optionally shuffled.
///
/// Ranking is the store's job (lowest `error_score` first); the shuffle
/// spreads load across equally-healthy proxies so one endpoint does not
/// absorb every request between score changes.
pub struct ProxyRanker {
    store: Arc<dyn ProxyStore>,
}

impl ProxyRanker {
    pub fn new(store: Arc<dyn ProxyStore>) -> Self {
        Self { store }
    }

    /// Fetch up to `limit` healthiest proxies. With `shuffle` the batch order
    /// is uniformly random; without it the store's ranking order is kept.
    pub async fn fetch(&self, limit: i64, shuffle: bool) -> Result<Vec<ProxyRecord>> {
        let mut batch = self.store.fetch_ranked(limit).await?;

        if shuffle {
            batch.shuffle(&mut rand::thread_rng());
        }

        Ok(batch)
    }
}
