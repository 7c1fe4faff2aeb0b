// Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4, canonical lowercase form)
pub type JobId = String;

/// Wall-clock instant in microseconds since the Unix epoch.
///
/// Microsecond resolution because the wire format carries fractional
/// seconds to six digits.
pub type Timestamp = i64;

/// Job lifecycle state.
///
/// The only legal transitions are PENDING -> RUNNING (claim),
/// RUNNING -> FINISHED (complete) and PENDING|RUNNING -> FINISHED
/// (cancel). FINISHED is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Finished,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "PENDING"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Finished => write!(f, "FINISHED"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobState::Pending),
            "RUNNING" => Ok(JobState::Running),
            "FINISHED" => Ok(JobState::Finished),
            other => Err(format!("unknown job state: {}", other)),
        }
    }
}

/// Listing filter. `Active` is the default and covers PENDING and
/// RUNNING; FINISHED jobs never appear in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Active,
    Pending,
    Running,
}

impl StateFilter {
    pub fn matches(&self, state: &JobState) -> bool {
        match self {
            StateFilter::Active => *state != JobState::Finished,
            StateFilter::Pending => *state == JobState::Pending,
            StateFilter::Running => *state == JobState::Running,
        }
    }
}

/// Job Entity - the only persistent record of the service.
///
/// Timestamps are injected, never read from the system clock here, so
/// the lifecycle logic stays deterministic under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    /// Opaque schema tag supplied by the submitter.
    pub version: String,
    pub state: JobState,

    pub created_time: Timestamp,
    pub claimed_time: Option<Timestamp>,
    pub finished_time: Option<Timestamp>,
    pub last_heartbeat_time: Option<Timestamp>,
}

impl Job {
    /// Create a new PENDING job.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `version` - Submitter-supplied schema tag
    /// * `created_time` - Creation timestamp (injected, not system time)
    pub fn new(id: impl Into<String>, version: impl Into<String>, created_time: Timestamp) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            state: JobState::Pending,
            created_time,
            claimed_time: None,
            finished_time: None,
            last_heartbeat_time: None,
        }
    }

    /// Transition PENDING -> RUNNING with explicit timestamp.
    pub fn claim(&mut self, now: Timestamp) -> Result<()> {
        if self.state != JobState::Pending {
            return Err(self.bad_transition(JobState::Running));
        }
        self.state = JobState::Running;
        self.claimed_time = Some(now);
        Ok(())
    }

    /// Record a worker heartbeat. Legal on RUNNING jobs only.
    pub fn record_heartbeat(&mut self, now: Timestamp) -> Result<()> {
        if self.state != JobState::Running {
            return Err(self.bad_transition(JobState::Running));
        }
        self.last_heartbeat_time = Some(now);
        Ok(())
    }

    /// Transition RUNNING -> FINISHED with explicit timestamp.
    pub fn complete(&mut self, now: Timestamp) -> Result<()> {
        if self.state != JobState::Running {
            return Err(self.bad_transition(JobState::Finished));
        }
        self.state = JobState::Finished;
        self.finished_time = Some(now);
        Ok(())
    }

    /// Transition PENDING|RUNNING -> FINISHED with explicit timestamp.
    ///
    /// `claimed_time` is preserved when the job already ran, so a
    /// cancelled-while-pending job is distinguishable from a cancelled
    /// running one.
    pub fn cancel(&mut self, now: Timestamp) -> Result<()> {
        if self.state == JobState::Finished {
            return Err(self.bad_transition(JobState::Finished));
        }
        self.state = JobState::Finished;
        self.finished_time = Some(now);
        Ok(())
    }

    fn bad_transition(&self, to: JobState) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
