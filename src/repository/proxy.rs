use crate::error::Result;
use crate::models::{NewProxy, ProxyRecord, ProxySelector, ERROR_SCORE_MAX, ERROR_SCORE_MIN};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

/// Storage seam for the pool engine.
///
/// Mutations addressed by a [`ProxySelector`] return `Ok(None)` when the
/// selector carries neither key; the row count is `Some` otherwise, even
/// when it is zero.
#[async_trait]
pub trait ProxyStore: Send + Sync {
    /// Fetch up to `limit` proxies, healthiest (lowest `error_score`) first
    async fn fetch_ranked(&self, limit: i64) -> Result<Vec<ProxyRecord>>;

    /// Insert a new proxy, returning the number of rows written
    async fn insert(&self, proxy: &NewProxy) -> Result<u64>;

    /// Delete the addressed proxy
    async fn delete(&self, selector: &ProxySelector) -> Result<Option<u64>>;

    /// Step the addressed proxy's `error_score` down on success or up on
    /// failure, clamped to the score bounds
    async fn update_error_score(&self, selector: &ProxySelector, success: bool)
        -> Result<Option<u64>>;

    /// Step `alt_success_counter` up or down for browser-automation traffic.
    /// Unlike `error_score` the counter is unbounded.
    async fn update_selenium_score(&self, id: i64, success: bool) -> Result<u64>;
}

/// Repository for proxy database operations
#[derive(Clone)]
pub struct ProxyRepository {
    pool: PgPool,
}

impl ProxyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProxyStore for ProxyRepository {
    async fn fetch_ranked(&self, limit: i64) -> Result<Vec<ProxyRecord>> {
        let proxies = sqlx::query_as::<_, ProxyRecord>(
            r#"
            SELECT id, url, port, country, town, speed, source_name,
                   upload_timestamp, error_score, alt_success_counter,
                   url || ':' || port::text AS full_url
            FROM proxies
            ORDER BY error_score ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(proxies)
    }

    async fn insert(&self, proxy: &NewProxy) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO proxies (url, port, country, town, speed, source_name, upload_timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&proxy.url)
        .bind(proxy.port)
        .bind(&proxy.country)
        .bind(&proxy.town)
        .bind(proxy.speed)
        .bind(&proxy.source_name)
        .bind(proxy.upload_timestamp)
        .execute(&self.pool)
        .await?;

        info!(url = %proxy.url, port = proxy.port, "Inserted proxy");

        Ok(result.rows_affected())
    }

    async fn delete(&self, selector: &ProxySelector) -> Result<Option<u64>> {
        let result = if let Some(id) = selector.id {
            sqlx::query("DELETE FROM proxies WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
        } else if let Some((url, port)) = selector.endpoint() {
            sqlx::query("DELETE FROM proxies WHERE url = $1 AND port = $2")
                .bind(url)
                .bind(port)
                .execute(&self.pool)
                .await?
        } else {
            return Ok(None);
        };

        info!(rows = result.rows_affected(), "Deleted proxy");

        Ok(Some(result.rows_affected()))
    }

    async fn update_error_score(
        &self,
        selector: &ProxySelector,
        success: bool,
    ) -> Result<Option<u64>> {
        // Success walks the score toward the lower bound; failure toward the
        // upper bound. Clamping happens in SQL so concurrent updates stay
        // within range.
        let result = if let Some(id) = selector.id {
            if success {
                sqlx::query(
                    "UPDATE proxies SET error_score = GREATEST(error_score - 1, $2) WHERE id = $1",
                )
                .bind(id)
                .bind(ERROR_SCORE_MIN)
                .execute(&self.pool)
                .await?
            } else {
                sqlx::query(
                    "UPDATE proxies SET error_score = LEAST(error_score + 1, $2) WHERE id = $1",
                )
                .bind(id)
                .bind(ERROR_SCORE_MAX)
                .execute(&self.pool)
                .await?
            }
        } else if let Some((url, port)) = selector.endpoint() {
            if success {
                sqlx::query(
                    "UPDATE proxies SET error_score = GREATEST(error_score - 1, $3) \
                     WHERE url = $1 AND port = $2",
                )
                .bind(url)
                .bind(port)
                .bind(ERROR_SCORE_MIN)
                .execute(&self.pool)
                .await?
            } else {
                sqlx::query(
                    "UPDATE proxies SET error_score = LEAST(error_score + 1, $3) \
                     WHERE url = $1 AND port = $2",
                )
                .bind(url)
                .bind(port)
                .bind(ERROR_SCORE_MAX)
                .execute(&self.pool)
                .await?
            }
        } else {
            return Ok(None);
        };

        Ok(Some(result.rows_affected()))
    }

    async fn update_selenium_score(&self, id: i64, success: bool) -> Result<u64> {
        let result = if success {
            sqlx::query(
                "UPDATE proxies SET alt_success_counter = alt_success_counter + 1 WHERE id = $1",
            )
            .bind(id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE proxies SET alt_success_counter = alt_success_counter - 1 WHERE id = $1",
            )
            .bind(id)
            .execute(&self.pool)
            .await?
        };

        Ok(result.rows_affected())
    }
}
