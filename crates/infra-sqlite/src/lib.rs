// Jobqueue Infrastructure - SQLite Adapter
// Implements the JobStore port over a pooled sqlx connection.

mod connection;
mod job_store;
mod migration;

pub use connection::create_pool;
pub use job_store::SqliteJobStore;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by a helper in job_store.rs
// (orphan rules prevent From<sqlx::Error> for AppError here).
