//! Proxpool Daemon - Entry Point
//!
//! Connects to PostgreSQL, runs migrations, and keeps the pool healthy by
//! running the background verifier with graceful shutdown support.

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod checker;
mod config;
mod database;
mod error;
mod models;
mod repository;
mod services;

use checker::ProxyChecker;
use config::Config;
use database::Database;
use repository::{ProxyRepository, ProxyStore};
use services::{VerifierHandle, VerifierService};

#[tokio::main]
async fn main() -> error::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxpool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Proxpool");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    // Connect to database
    let db = Database::new(&config).await?;

    // Run migrations
    db.run_migrations().await?;

    let latency = db.health_check().await?;
    info!(latency_ms = latency.as_millis() as u64, "Database healthy");

    let store: Arc<dyn ProxyStore> = Arc::new(ProxyRepository::new(db.pool().clone()));

    let universe = store.fetch_ranked(config.pool.universe_size).await?;
    info!(proxies = universe.len(), "Pool ready");

    // Start verifier service
    let (verifier_handle, verifier_shutdown) = VerifierHandle::new();
    let verifier = VerifierService::new(
        store.clone(),
        ProxyChecker::new(config.checker.clone()),
        config.verifier.clone(),
    );
    let verifier_task = tokio::spawn(async move {
        verifier.run(verifier_shutdown).await;
    });

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    verifier_handle.shutdown();
    let _ = tokio::join!(verifier_task);

    db.close().await;

    info!("Proxpool stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
