//! HTTP Request/Response Types
//!
//! The wire boundary: states and timestamps take their JSON form here
//! and nowhere else.

use chrono::DateTime;
use jobqueue_core::domain::{Job, JobState, StateFilter, Timestamp};
use jobqueue_core::error::AppError;
use serde::{Deserialize, Serialize};

/// POST /0.1.0/job/new
#[derive(Debug, Deserialize)]
pub struct NewJobRequest {
    pub version: String,
}

/// Response carrying a job id (new, claim).
#[derive(Debug, Serialize)]
pub struct JobIdResponse {
    pub job_id: String,
}

/// GET /0.1.0/jobs?state=…
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
}

impl ListQuery {
    /// No filter means ACTIVE (everything not yet FINISHED). Only the
    /// two explicit narrowing filters are accepted on the wire.
    pub fn filter(&self) -> Result<StateFilter, AppError> {
        match self.state.as_deref() {
            None => Ok(StateFilter::Active),
            Some("PENDING") => Ok(StateFilter::Pending),
            Some("RUNNING") => Ok(StateFilter::Running),
            Some(other) => Err(AppError::Validation(format!(
                "Unsupported state filter: {}",
                other
            ))),
        }
    }
}

/// Wire form of a job record. Absent timestamps serialize as null.
#[derive(Debug, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub version: String,
    pub state: JobState,
    pub created_time: String,
    pub claimed_time: Option<String>,
    pub finished_time: Option<String>,
    pub last_heartbeat_time: Option<String>,
}

impl From<Job> for JobRecord {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            version: job.version,
            state: job.state,
            created_time: format_timestamp(job.created_time),
            claimed_time: job.claimed_time.map(format_timestamp),
            finished_time: job.finished_time.map(format_timestamp),
            last_heartbeat_time: job.last_heartbeat_time.map(format_timestamp),
        }
    }
}

/// ISO-8601 UTC with six fractional digits,
/// e.g. `2026-08-01T12:34:56.000123`.
fn format_timestamp(micros: Timestamp) -> String {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
        .unwrap_or_default()
}
