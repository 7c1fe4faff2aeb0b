// SQLite Connection Pool Setup

use jobqueue_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Create the SQLite connection pool with WAL mode.
///
/// # Configuration
/// - `JOBQUEUE_POOL_SIZE`: Max connections (default: 20)
/// - `JOBQUEUE_POOL_TIMEOUT`: Busy timeout in seconds (default: 5)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let max_connections: u32 = std::env::var("JOBQUEUE_POOL_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    let busy_timeout_secs: u64 = std::env::var("JOBQUEUE_POOL_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Database(e.to_string()))?
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(busy_timeout_secs))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(pool)
}
