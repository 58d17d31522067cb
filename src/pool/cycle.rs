use crate::error::Result;
use crate::models::ProxyRecord;
use crate::pool::ProxyRanker;

/// Rotation cursor over a materialized batch of proxies.
///
/// When the cursor runs off the end of the batch, `pull` refetches a fresh
/// shuffled batch before serving; callers never observe the refill. An empty
/// universe surfaces as `Ok(None)` rather than blocking, so callers choose
/// their own retry cadence.
pub struct ProxyCycle {
    ranker: ProxyRanker,
    universe_size: i64,
    batch: Vec<ProxyRecord>,
    cursor: usize,
}

impl ProxyCycle {
    pub fn new(ranker: ProxyRanker, universe_size: i64) -> Self {
        Self {
            ranker,
            universe_size,
            batch: Vec::new(),
            cursor: 0,
        }
    }

    /// Serve the next proxy, refilling the batch when exhausted.
    pub async fn pull(&mut self) -> Result<Option<ProxyRecord>> {
        if self.cursor >= self.batch.len() {
            let fresh = self.ranker.fetch(self.universe_size, true).await?;
            if fresh.is_empty() {
                return Ok(None);
            }
            // State changes only after the fetch lands, so an error or a
            // cancelled refill leaves the cycle exactly as it was.
            self.batch = fresh;
            self.cursor = 0;
        }

        let record = self.batch[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProxy;
    use crate::pool::MemoryStore;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn cycle_over(store: Arc<MemoryStore>, universe_size: i64) -> ProxyCycle {
        ProxyCycle::new(ProxyRanker::new(store), universe_size)
    }

    #[tokio::test]
    async fn test_pull_serves_whole_batch_before_refill() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..4 {
            store.seed(NewProxy::new(format!("10.0.0.{}", i), 80), 0).await;
        }

        let mut cycle = cycle_over(store.clone(), 10);

        let mut seen = HashSet::new();
        for _ in 0..4 {
            let record = cycle.pull().await.unwrap().unwrap();
            seen.insert(record.id);
        }

        // One fetch serves the whole batch.
        assert_eq!(seen.len(), 4);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_pull_refills_after_exhaustion() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewProxy::new("1.1.1.1", 80), 0).await;
        store.seed(NewProxy::new("2.2.2.2", 80), 0).await;

        let mut cycle = cycle_over(store.clone(), 10);

        for _ in 0..5 {
            assert!(cycle.pull().await.unwrap().is_some());
        }

        // Two pulls per batch, so five pulls cost three fetches.
        assert_eq!(store.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_pull_empty_universe_returns_none() {
        let store = Arc::new(MemoryStore::new());
        let mut cycle = cycle_over(store.clone(), 10);

        assert!(cycle.pull().await.unwrap().is_none());
        assert!(cycle.pull().await.unwrap().is_none());

        // Each pull re-checks the store instead of spinning internally.
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_pull_recovers_after_universe_fills() {
        let store = Arc::new(MemoryStore::new());
        let mut cycle = cycle_over(store.clone(), 10);

        assert!(cycle.pull().await.unwrap().is_none());

        store.seed(NewProxy::new("1.1.1.1", 80), 0).await;
        let record = cycle.pull().await.unwrap().unwrap();
        assert_eq!(record.full_url, "1.1.1.1:80");
    }

    #[tokio::test]
    async fn test_pull_batch_is_capped_by_universe_size() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..6 {
            store.seed(NewProxy::new(format!("10.0.0.{}", i), 80), i).await;
        }

        let mut cycle = cycle_over(store.clone(), 3);

        for _ in 0..3 {
            assert!(cycle.pull().await.unwrap().is_some());
        }
        assert_eq!(store.fetch_count(), 1);

        // Fourth pull crosses a batch boundary.
        assert!(cycle.pull().await.unwrap().is_some());
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_served_records_carry_full_url() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewProxy::new("1.2.3.4", 8080), 0).await;

        let mut cycle = cycle_over(store, 10);
        let record = cycle.pull().await.unwrap().unwrap();
        assert_eq!(record.full_url, "1.2.3.4:8080");
    }
}
