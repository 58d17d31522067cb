use thiserror::Error;

/// Unified error type for the proxpool crate
#[derive(Error, Debug)]
pub enum PoolError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for proxpool operations
pub type Result<T> = std::result::Result<T, PoolError>;
