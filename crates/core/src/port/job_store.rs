// Job Store Port (Interface)

use crate::domain::{Job, JobId, JobState, StateFilter, Timestamp};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence interface for Job records.
///
/// Implementations must be safe under concurrent callers:
/// `claim_next_pending` hands any given job to at most one caller, and
/// `update_from` only writes when the stored state still matches the
/// caller's expectation (compare-and-swap).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails with `Conflict` if the id is taken.
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find a job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// List jobs matching the filter, oldest first.
    async fn list(&self, filter: StateFilter) -> Result<Vec<Job>>;

    /// Atomically pop one PENDING job: mark it RUNNING with the given
    /// claim timestamp and return it. Selection is oldest
    /// `created_time` first, ties broken by id. Returns `None` when no
    /// PENDING job exists.
    async fn claim_next_pending(&self, claimed_time: Timestamp) -> Result<Option<Job>>;

    /// Persist `job` only if the stored record is still in `expected`
    /// state. Returns false when the guard fails (somebody else moved
    /// the job first) or the id is gone.
    async fn update_from(&self, job: &Job, expected: JobState) -> Result<bool>;
}
