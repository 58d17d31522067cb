use crate::config::PoolConfig;
use crate::error::Result;
use crate::models::{NewProxy, ProxyRecord, ProxySelector};
use crate::pool::{ProxyCycle, ProxyRanker};
use crate::repository::ProxyStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Facade over the rotation cycle and the store.
///
/// The cycle lives behind an async mutex so concurrent `next_proxy` calls
/// are serialized: a refill in flight cannot be doubled up and no proxy is
/// served twice from one cursor position. Outcome reports and pool edits go
/// straight to the store and do not contend for the cycle lock.
pub struct ProxyPool {
    store: Arc<dyn ProxyStore>,
    cycle: Mutex<ProxyCycle>,
}

impl ProxyPool {
    pub fn new(store: Arc<dyn ProxyStore>, config: &PoolConfig) -> Self {
        let ranker = ProxyRanker::new(store.clone());
        Self {
            store,
            cycle: Mutex::new(ProxyCycle::new(ranker, config.universe_size)),
        }
    }

    /// Next proxy in rotation, or `None` while the universe is empty
    pub async fn next_proxy(&self) -> Result<Option<ProxyRecord>> {
        let mut cycle = self.cycle.lock().await;
        cycle.pull().await
    }

    /// Report a request outcome against the addressed proxy.
    ///
    /// Returns the affected row count, or `None` when the selector carries
    /// neither key.
    pub async fn report_outcome(
        &self,
        selector: &ProxySelector,
        success: bool,
    ) -> Result<Option<u64>> {
        self.store.update_error_score(selector, success).await
    }

    /// Report a browser-automation outcome against a proxy by id
    pub async fn report_selenium_outcome(&self, id: i64, success: bool) -> Result<u64> {
        self.store.update_selenium_score(id, success).await
    }

    /// Add a proxy to the pool
    pub async fn insert(&self, proxy: &NewProxy) -> Result<u64> {
        self.store.insert(proxy).await
    }

    /// Remove the addressed proxy from the pool
    pub async fn delete(&self, selector: &ProxySelector) -> Result<Option<u64>> {
        self.store.delete(selector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ERROR_SCORE_MAX, ERROR_SCORE_MIN};
    use crate::pool::MemoryStore;

    fn pool_config(universe_size: i64) -> PoolConfig {
        PoolConfig { universe_size }
    }

    #[tokio::test]
    async fn test_next_proxy_empty_universe() {
        let store = Arc::new(MemoryStore::new());
        let pool = ProxyPool::new(store, &pool_config(10));

        assert!(pool.next_proxy().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_proxy_rotates() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewProxy::new("1.1.1.1", 80), 0).await;
        store.seed(NewProxy::new("2.2.2.2", 80), 0).await;

        let pool = ProxyPool::new(store, &pool_config(10));

        let first = pool.next_proxy().await.unwrap().unwrap();
        let second = pool.next_proxy().await.unwrap().unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_concurrent_next_proxy_never_doubles_a_slot() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..8 {
            store.seed(NewProxy::new(format!("10.0.0.{}", i), 80), 0).await;
        }

        let pool = Arc::new(ProxyPool::new(store, &pool_config(8)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.next_proxy().await.unwrap().unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        // Eight pulls drain one batch of eight distinct proxies.
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[tokio::test]
    async fn test_report_outcome_moves_score() {
        let store = Arc::new(MemoryStore::new());
        let id = store.seed(NewProxy::new("1.1.1.1", 80), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let rows = pool
            .report_outcome(&ProxySelector::by_id(id), false)
            .await
            .unwrap();
        assert_eq!(rows, Some(1));
        assert_eq!(store.error_score(id), Some(1));

        let rows = pool
            .report_outcome(&ProxySelector::by_id(id), true)
            .await
            .unwrap();
        assert_eq!(rows, Some(1));
        assert_eq!(store.error_score(id), Some(0));
    }

    #[tokio::test]
    async fn test_report_outcome_by_endpoint() {
        let store = Arc::new(MemoryStore::new());
        let id = store.seed(NewProxy::new("1.2.3.4", 8080), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let rows = pool
            .report_outcome(&ProxySelector::by_endpoint("1.2.3.4", 8080), false)
            .await
            .unwrap();
        assert_eq!(rows, Some(1));
        assert_eq!(store.error_score(id), Some(1));
    }

    #[tokio::test]
    async fn test_report_outcome_invalid_selector_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let id = store.seed(NewProxy::new("1.1.1.1", 80), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let rows = pool
            .report_outcome(&ProxySelector::default(), false)
            .await
            .unwrap();
        assert_eq!(rows, None);
        assert_eq!(store.error_score(id), Some(0));
    }

    #[tokio::test]
    async fn test_report_outcome_id_takes_precedence() {
        let store = Arc::new(MemoryStore::new());
        let by_id = store.seed(NewProxy::new("1.1.1.1", 80), 0).await;
        let by_endpoint = store.seed(NewProxy::new("2.2.2.2", 80), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let selector = ProxySelector {
            id: Some(by_id),
            url: Some("2.2.2.2".to_string()),
            port: Some(80),
        };
        pool.report_outcome(&selector, false).await.unwrap();

        assert_eq!(store.error_score(by_id), Some(1));
        assert_eq!(store.error_score(by_endpoint), Some(0));
    }

    #[tokio::test]
    async fn test_report_outcome_clamps_at_bounds() {
        let store = Arc::new(MemoryStore::new());
        let worst = store.seed(NewProxy::new("1.1.1.1", 80), ERROR_SCORE_MAX).await;
        let best = store.seed(NewProxy::new("2.2.2.2", 80), ERROR_SCORE_MIN).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        for _ in 0..3 {
            pool.report_outcome(&ProxySelector::by_id(worst), false)
                .await
                .unwrap();
            pool.report_outcome(&ProxySelector::by_id(best), true)
                .await
                .unwrap();
        }

        assert_eq!(store.error_score(worst), Some(ERROR_SCORE_MAX));
        assert_eq!(store.error_score(best), Some(ERROR_SCORE_MIN));
    }

    #[tokio::test]
    async fn test_selenium_counter_is_unbounded_both_ways() {
        let store = Arc::new(MemoryStore::new());
        let id = store.seed(NewProxy::new("1.1.1.1", 80), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        for _ in 0..3 {
            pool.report_selenium_outcome(id, false).await.unwrap();
        }
        assert_eq!(store.alt_success_counter(id), Some(-3));

        for _ in 0..5 {
            pool.report_selenium_outcome(id, true).await.unwrap();
        }
        assert_eq!(store.alt_success_counter(id), Some(2));
    }

    #[tokio::test]
    async fn test_insert_and_delete_roundtrip() {
        let store = Arc::new(MemoryStore::new());
        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let rows = pool.insert(&NewProxy::new("1.2.3.4", 8080)).await.unwrap();
        assert_eq!(rows, 1);

        let record = pool.next_proxy().await.unwrap().unwrap();
        assert_eq!(record.full_url, "1.2.3.4:8080");

        let rows = pool.delete(&record.selector()).await.unwrap();
        assert_eq!(rows, Some(1));
    }

    #[tokio::test]
    async fn test_delete_missing_proxy_reports_zero_rows() {
        let store = Arc::new(MemoryStore::new());
        let pool = ProxyPool::new(store, &pool_config(10));

        let rows = pool.delete(&ProxySelector::by_id(999)).await.unwrap();
        assert_eq!(rows, Some(0));
    }

    #[tokio::test]
    async fn test_delete_invalid_selector_is_noop() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewProxy::new("1.1.1.1", 80), 0).await;

        let pool = ProxyPool::new(store.clone(), &pool_config(10));

        let rows = pool.delete(&ProxySelector::default()).await.unwrap();
        assert_eq!(rows, None);
        assert_eq!(store.len(), 1);
    }
}
