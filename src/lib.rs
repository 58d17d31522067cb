//! Proxpool - Scored Rotating Proxy Pool
//!
//! A PostgreSQL-backed proxy pool that hands out proxies in health-ranked
//! rotation, folds request outcomes back into per-proxy scores, and prunes
//! dead proxies in the background.

pub mod checker;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod pool;
pub mod repository;
pub mod services;

pub use checker::ProxyChecker;
pub use config::Config;
pub use database::Database;
pub use error::{PoolError, Result};
pub use models::{NewProxy, ProxyRecord, ProxySelector};
pub use pool::ProxyPool;
