//! HTTP Server
//!
//! Routes for the `/0.1.0` API. Axum's method routing answers 405 for
//! a wrong verb on a known path and the default fallback answers 404
//! for unknown paths, which is exactly the dispatch contract.

use axum::routing::{get, post};
use axum::Router;
use jobqueue_core::error::{AppError, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handler::{self, AppState};

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8314;

/// HTTP Server Configuration
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/0.1.0/job/new", post(handler::new_job))
        .route("/0.1.0/jobs", get(handler::list_jobs))
        .route("/0.1.0/job/claim", post(handler::claim_job))
        .route("/0.1.0/job/:job_id/status", get(handler::job_status))
        .route("/0.1.0/job/:job_id/heartbeat", post(handler::job_heartbeat))
        .route("/0.1.0/job/:job_id/complete", post(handler::job_complete))
        .route("/0.1.0/job/:job_id/cancel", post(handler::job_cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until ctrl-c.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            "HTTP server listening"
        );

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(|e| AppError::Internal(format!("HTTP server error: {}", e)))
    }
}
