//! HTTP/JSON API Layer
//!
//! Exposes the job lifecycle over REST under the `/0.1.0` prefix.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::AppState;
pub use server::{build_router, HttpServer, HttpServerConfig};
