use crate::error::{PoolError, Result};
use sqlx::PgPool;
use tracing::info;

/// Run all database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    // Create migrations table if not exists
    create_migrations_table(pool).await?;

    // Run each migration in order
    let migrations = get_migrations();

    for (version, name, sql) in migrations {
        if !is_migration_applied(pool, version).await? {
            info!(version = version, name = name, "Applying migration");

            // Execute migration
            sqlx::query(sql)
                .execute(pool)
                .await
                .map_err(PoolError::Database)?;

            // Record migration
            record_migration(pool, version, name).await?;

            info!(version = version, name = name, "Migration applied successfully");
        }
    }

    Ok(())
}

/// Create the migrations tracking table
async fn create_migrations_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(PoolError::Database)?;

    Ok(())
}

/// Check if a migration has been applied
async fn is_migration_applied(pool: &PgPool, version: i32) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = $1",
    )
    .bind(version)
    .fetch_one(pool)
    .await
    .map_err(PoolError::Database)?;

    Ok(result > 0)
}

/// Record a migration as applied
async fn record_migration(pool: &PgPool, version: i32, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await
        .map_err(PoolError::Database)?;

    Ok(())
}

/// Get all migrations in order
fn get_migrations() -> Vec<(i32, &'static str, &'static str)> {
    vec![(1, "initial_schema", MIGRATION_001_INITIAL_SCHEMA)]
}

// Migration 1: Initial schema with proxies table
const MIGRATION_001_INITIAL_SCHEMA: &str = r#"
-- Proxies table
CREATE TABLE IF NOT EXISTS proxies (
    id BIGSERIAL PRIMARY KEY,
    url VARCHAR(255) NOT NULL,
    port INTEGER NOT NULL,
    country VARCHAR(100),
    town VARCHAR(100),
    speed INTEGER,
    source_name VARCHAR(255),
    upload_timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    error_score INTEGER NOT NULL DEFAULT 0,
    alt_success_counter INTEGER NOT NULL DEFAULT 0
);

-- Indexes for ranked fetches and endpoint lookups
CREATE INDEX IF NOT EXISTS idx_proxies_error_score ON proxies(error_score ASC);
CREATE INDEX IF NOT EXISTS idx_proxies_endpoint ON proxies(url, port);
"#;
