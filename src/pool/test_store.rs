//! In-memory `ProxyStore` used by the engine tests

use crate::error::Result;
use crate::models::{NewProxy, ProxyRecord, ProxySelector, ERROR_SCORE_MAX, ERROR_SCORE_MIN};
use crate::repository::ProxyStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Store fake mirroring the repository's ranking, clamping, and selector
/// semantics against a plain `Vec`.
pub(crate) struct MemoryStore {
    rows: Mutex<Vec<ProxyRecord>>,
    next_id: AtomicI64,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Insert a row with a preset score, returning its id
    pub(crate) async fn seed(&self, proxy: NewProxy, error_score: i32) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = ProxyRecord {
            id,
            full_url: format!("{}:{}", proxy.url, proxy.port),
            url: proxy.url,
            port: proxy.port,
            country: proxy.country,
            town: proxy.town,
            speed: proxy.speed,
            source_name: proxy.source_name,
            upload_timestamp: proxy.upload_timestamp,
            error_score,
            alt_success_counter: 0,
        };
        self.rows.lock().unwrap().push(record);
        id
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn error_score(&self, id: i64) -> Option<i32> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.error_score)
    }

    pub(crate) fn alt_success_counter(&self, id: i64) -> Option<i32> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.alt_success_counter)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ProxyStore for MemoryStore {
    async fn fetch_ranked(&self, limit: i64) -> Result<Vec<ProxyRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|r| r.error_score);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn insert(&self, proxy: &NewProxy) -> Result<u64> {
        self.seed(proxy.clone(), 0).await;
        Ok(1)
    }

    async fn delete(&self, selector: &ProxySelector) -> Result<Option<u64>> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();

        if let Some(id) = selector.id {
            rows.retain(|r| r.id != id);
        } else if let Some((url, port)) = selector.endpoint() {
            rows.retain(|r| !(r.url == url && r.port == port));
        } else {
            return Ok(None);
        }

        Ok(Some((before - rows.len()) as u64))
    }

    async fn update_error_score(
        &self,
        selector: &ProxySelector,
        success: bool,
    ) -> Result<Option<u64>> {
        let mut rows = self.rows.lock().unwrap();
        let mut affected = 0u64;

        let matches: Box<dyn Fn(&ProxyRecord) -> bool> = if let Some(id) = selector.id {
            Box::new(move |r| r.id == id)
        } else if let Some((url, port)) = selector.endpoint() {
            let url = url.to_string();
            Box::new(move |r| r.url == url && r.port == port)
        } else {
            return Ok(None);
        };

        for row in rows.iter_mut().filter(|r| matches(r)) {
            row.error_score = if success {
                (row.error_score - 1).max(ERROR_SCORE_MIN)
            } else {
                (row.error_score + 1).min(ERROR_SCORE_MAX)
            };
            affected += 1;
        }

        Ok(Some(affected))
    }

    async fn update_selenium_score(&self, id: i64, success: bool) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut affected = 0u64;

        for row in rows.iter_mut().filter(|r| r.id == id) {
            row.alt_success_counter += if success { 1 } else { -1 };
            affected += 1;
        }

        Ok(affected)
    }
}
