// SQLite JobStore Implementation

use async_trait::async_trait;
use jobqueue_core::domain::{Job, JobId, JobState, StateFilter, Timestamp};
use jobqueue_core::error::{AppError, Result};
use jobqueue_core::port::JobStore;
use sqlx::SqlitePool;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE constraint failed
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        AppError::Database(format!(
                            "Database locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        AppError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, version, state,
                created_time, claimed_time, finished_time, last_heartbeat_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.version)
        .bind(job.state.to_string())
        .bind(job.created_time)
        .bind(job.claimed_time)
        .bind(job.finished_time)
        .bind(job.last_heartbeat_time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn list(&self, filter: StateFilter) -> Result<Vec<Job>> {
        let query = match filter {
            StateFilter::Active => sqlx::query_as::<_, JobRow>(
                "SELECT * FROM jobs WHERE state <> ? ORDER BY created_time ASC, id ASC",
            )
            .bind(JobState::Finished.to_string()),
            StateFilter::Pending => sqlx::query_as::<_, JobRow>(
                "SELECT * FROM jobs WHERE state = ? ORDER BY created_time ASC, id ASC",
            )
            .bind(JobState::Pending.to_string()),
            StateFilter::Running => sqlx::query_as::<_, JobRow>(
                "SELECT * FROM jobs WHERE state = ? ORDER BY created_time ASC, id ASC",
            )
            .bind(JobState::Running.to_string()),
        };

        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn claim_next_pending(&self, claimed_time: Timestamp) -> Result<Option<Job>> {
        // Single-statement pop: selection and transition commit
        // together, so concurrent claimers can never pop the same row.
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET state = ?, claimed_time = ?
            WHERE id = (
                SELECT id FROM jobs
                WHERE state = ?
                ORDER BY created_time ASC, id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(JobState::Running.to_string())
        .bind(claimed_time)
        .bind(JobState::Pending.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn update_from(&self, job: &Job, expected: JobState) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = ?, claimed_time = ?, finished_time = ?, last_heartbeat_time = ?
            WHERE id = ? AND state = ?
            "#,
        )
        .bind(job.state.to_string())
        .bind(job.claimed_time)
        .bind(job.finished_time)
        .bind(job.last_heartbeat_time)
        .bind(&job.id)
        .bind(expected.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }
}

/// SQLite row representation of a job record.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    version: String,
    state: String,
    created_time: i64,
    claimed_time: Option<i64>,
    finished_time: Option<i64>,
    last_heartbeat_time: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        // An unknown state string means a corrupt row, not a fallback.
        let state: JobState = self.state.parse()?;

        Ok(Job {
            id: self.id,
            version: self.version,
            state,
            created_time: self.created_time,
            claimed_time: self.claimed_time,
            finished_time: self.finished_time,
            last_heartbeat_time: self.last_heartbeat_time,
        })
    }
}
