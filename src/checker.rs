//! Liveness probe for individual proxies

use crate::config::CheckerConfig;
use reqwest::{Client, Proxy};
use tracing::debug;

/// Probes a proxy by fetching an IP-echo endpoint through it.
///
/// A probe succeeds on the first attempt that returns a success status;
/// every failed attempt consumes budget and is followed by a fixed pause.
/// `false` after the exhausted budget is the dead-proxy signal.
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Check whether the proxy at `full_url` (host:port) can carry traffic.
    pub async fn probe(&self, full_url: &str) -> bool {
        for attempt in 1..=self.config.max_attempts {
            match self.attempt(full_url).await {
                Ok(true) => {
                    debug!(proxy = full_url, attempt, "Probe succeeded");
                    return true;
                }
                Ok(false) => {
                    debug!(proxy = full_url, attempt, "Probe got non-success status");
                }
                Err(e) => {
                    debug!(proxy = full_url, attempt, error = %e, "Probe attempt failed");
                }
            }

            tokio::time::sleep(self.config.retry_delay).await;
        }

        false
    }

    async fn attempt(&self, full_url: &str) -> reqwest::Result<bool> {
        let proxy = Proxy::all(format!("http://{}", full_url))?;
        let client = Client::builder()
            .proxy(proxy)
            .timeout(self.config.timeout)
            .build()?;

        let response = client.get(&self.config.probe_url).send().await?;
        let status = response.status();

        // The echoed egress IP is informational only; operators can grep for
        // mismatches, but transparent proxies still count as alive.
        if let Ok(body) = response.json::<serde_json::Value>().await {
            if let Some(origin) = body.get("origin").and_then(|v| v.as_str()) {
                let host = full_url.split(':').next().unwrap_or(full_url);
                debug!(proxy = full_url, origin, host, "Probe egress IP");
            }
        }

        Ok(status.is_success())
    }
}
