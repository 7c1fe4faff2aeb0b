// Job Lifecycle Manager
//
// Implements the six lifecycle operations (create, claim, heartbeat,
// complete, cancel, status/list) on top of the store port. State
// checks live in the domain transition methods; persistence races are
// resolved with the store's compare-and-swap write.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Job, JobId, StateFilter, Timestamp};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, TimeProvider};

#[cfg(test)]
#[path = "job_manager_test.rs"]
mod job_manager_test;

/// Version tags are short opaque strings; anything longer is rejected
/// before it reaches storage.
const MAX_VERSION_LEN: usize = 64;

/// A CAS write only loses to a concurrent transition. Every losing
/// path either turns illegal on re-read (terminal state) or succeeds
/// on the next attempt, so a small bound suffices.
const MAX_CAS_ATTEMPTS: usize = 4;

pub struct JobManager {
    store: Arc<dyn JobStore>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl JobManager {
    pub fn new(
        store: Arc<dyn JobStore>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// Create a new PENDING job and return its id.
    pub async fn create(&self, version: &str) -> Result<JobId> {
        validate_version(version)?;

        let job = Job::new(
            self.ids.generate_id(),
            version,
            self.clock.now_micros(),
        );
        self.store.insert(&job).await?;

        debug!(job_id = %job.id, version = %job.version, "job created");
        Ok(job.id)
    }

    /// Atomically claim one PENDING job, oldest first. `None` when the
    /// queue has nothing pending.
    pub async fn claim(&self) -> Result<Option<Job>> {
        let claimed = self
            .store
            .claim_next_pending(self.clock.now_micros())
            .await?;

        if let Some(job) = &claimed {
            debug!(job_id = %job.id, "job claimed");
        }
        Ok(claimed)
    }

    /// Record a worker heartbeat on a RUNNING job.
    pub async fn heartbeat(&self, id: &JobId) -> Result<Job> {
        self.transition(id, Job::record_heartbeat).await
    }

    /// Transition a RUNNING job to FINISHED.
    pub async fn complete(&self, id: &JobId) -> Result<Job> {
        self.transition(id, Job::complete).await
    }

    /// Transition a PENDING or RUNNING job to FINISHED.
    pub async fn cancel(&self, id: &JobId) -> Result<Job> {
        self.transition(id, Job::cancel).await
    }

    /// Full record lookup.
    pub async fn status(&self, id: &JobId) -> Result<Job> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// List records matching the filter, oldest first.
    pub async fn list(&self, filter: StateFilter) -> Result<Vec<Job>> {
        self.store.list(filter).await
    }

    /// Read-transition-CAS loop shared by heartbeat/complete/cancel.
    ///
    /// A lost CAS means another caller moved the job between our read
    /// and write; re-reading re-runs the domain check against the new
    /// state, so illegal transitions still surface as domain errors.
    async fn transition(
        &self,
        id: &JobId,
        apply: fn(&mut Job, Timestamp) -> crate::domain::error::Result<()>,
    ) -> Result<Job> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut job = self
                .store
                .find_by_id(id)
                .await?
                .ok_or_else(|| not_found(id))?;

            let expected = job.state.clone();
            apply(&mut job, self.clock.now_micros())?;

            if self.store.update_from(&job, expected).await? {
                debug!(job_id = %id, state = %job.state, "job transitioned");
                return Ok(job);
            }

            debug!(job_id = %id, "job moved concurrently, retrying transition");
        }

        Err(AppError::Conflict(format!(
            "Job {} transition kept losing to concurrent updates",
            id
        )))
    }
}

fn not_found(id: &JobId) -> AppError {
    AppError::NotFound(format!("Job {} not found", id))
}

fn validate_version(version: &str) -> Result<()> {
    if version.len() > MAX_VERSION_LEN {
        return Err(AppError::Validation(format!(
            "Version too long (max {} bytes, got {})",
            MAX_VERSION_LEN,
            version.len()
        )));
    }
    if !version.is_ascii() {
        return Err(AppError::Validation(
            "Version must be ASCII".to_string(),
        ));
    }
    Ok(())
}
