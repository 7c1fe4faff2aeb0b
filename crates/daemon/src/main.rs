//! Jobqueue Daemon - Main Entry Point
//!
//! Composition root: logging, configuration, storage bootstrap, DI
//! wiring and the HTTP server.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobqueue_api_http::{AppState, HttpServer, HttpServerConfig};
use jobqueue_core::application::JobManager;
use jobqueue_core::port::id_provider::UuidProvider;
use jobqueue_core::port::time_provider::SystemTimeProvider;
use jobqueue_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.jobqueue/jobs.db";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON format for production)
    let log_format = std::env::var("JOBQUEUE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("jobqueue=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Jobqueue daemon v{} starting...", VERSION);

    // 2. Load configuration
    let db_path = std::env::var("JOBQUEUE_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let http_host =
        std::env::var("JOBQUEUE_HTTP_HOST").unwrap_or_else(|_| HttpServerConfig::default().host);

    let http_port: u16 = std::env::var("JOBQUEUE_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| HttpServerConfig::default().port);

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let store = Arc::new(SqliteJobStore::new(pool));
    let manager = Arc::new(JobManager::new(
        store,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));

    // 5. Serve HTTP until ctrl-c
    let config = HttpServerConfig {
        host: http_host,
        port: http_port,
    };
    let server = HttpServer::new(config, AppState { manager });

    info!("System ready. Press Ctrl+C to shutdown");
    server
        .serve()
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {}", e))?;

    info!("Shutdown complete.");

    Ok(())
}
