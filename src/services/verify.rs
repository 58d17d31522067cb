//! Proxy verifier service
//!
//! Periodically probes the pool's proxies and deletes the ones that no
//! longer carry traffic.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, instrument};

use crate::checker::ProxyChecker;
use crate::config::VerifierConfig;
use crate::error::Result;
use crate::models::ProxyRecord;
use crate::repository::ProxyStore;

/// Proxy verifier service
pub struct VerifierService {
    store: Arc<dyn ProxyStore>,
    checker: ProxyChecker,
    config: VerifierConfig,
}

impl VerifierService {
    pub fn new(store: Arc<dyn ProxyStore>, checker: ProxyChecker, config: VerifierConfig) -> Self {
        Self {
            store,
            checker,
            config,
        }
    }

    /// Run the verifier service
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting verifier service (interval: {}s, batch_limit: {}, workers: {})",
            self.config.interval.as_secs(),
            self.config.batch_limit,
            self.config.workers
        );

        // Initial round on startup.
        if let Err(e) = self.verify_round().await {
            error!("Initial verification round failed: {}", e);
        }

        let mut ticker = interval(self.config.interval);
        ticker.tick().await; // Skip immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.verify_round().await {
                        error!("Verification round failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Verifier service shutting down");
                        break;
                    }
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn verify_round(&self) -> Result<()> {
        let candidates = self.store.fetch_ranked(self.config.batch_limit).await?;
        if candidates.is_empty() {
            return Ok(());
        }

        let total = candidates.len();

        let dead: Vec<ProxyRecord> = stream::iter(candidates)
            .map(|proxy| async move {
                let alive = self.checker.probe(&proxy.full_url).await;
                (proxy, alive)
            })
            .buffer_unordered(self.config.workers)
            .filter_map(|(proxy, alive)| async move { (!alive).then_some(proxy) })
            .collect()
            .await;

        let mut removed = 0u64;
        for proxy in &dead {
            match self.store.delete(&proxy.selector()).await {
                Ok(rows) => removed += rows.unwrap_or(0),
                Err(e) => error!(proxy = %proxy.full_url, "Failed to delete dead proxy: {}", e),
            }
        }

        info!(
            probed = total,
            dead = dead.len(),
            removed,
            "Verification round complete"
        );

        Ok(())
    }
}

/// Handle for managing the verifier service
pub struct VerifierHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl VerifierHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Default for VerifierHandle {
    fn default() -> Self {
        Self::new().0
    }
}
