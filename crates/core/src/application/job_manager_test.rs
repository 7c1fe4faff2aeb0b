//! Unit tests for the JobManager against an in-memory store with
//! deterministic id and clock providers.

use super::*;
use crate::domain::JobState;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

struct MemoryStore {
    jobs: Mutex<BTreeMap<JobId, Job>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            jobs: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(AppError::Conflict(format!("duplicate job id {}", job.id)));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: StateFilter) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock().unwrap();
        let mut out: Vec<Job> = jobs
            .values()
            .filter(|j| filter.matches(&j.state))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.created_time, &a.id).cmp(&(b.created_time, &b.id)));
        Ok(out)
    }

    async fn claim_next_pending(&self, claimed_time: Timestamp) -> Result<Option<Job>> {
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs
            .values()
            .filter(|j| j.state == JobState::Pending)
            .min_by(|a, b| (a.created_time, &a.id).cmp(&(b.created_time, &b.id)))
            .map(|j| j.id.clone());

        match next {
            Some(id) => {
                let job = jobs.get_mut(&id).unwrap();
                job.claim(claimed_time).map_err(AppError::from)?;
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_from(&self, job: &Job, expected: JobState) -> Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&job.id) {
            Some(stored) if stored.state == expected => {
                *stored = job.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Store wrapper that rejects the first N CAS writes, to exercise the
/// manager's retry loop.
struct FlakyStore {
    inner: MemoryStore,
    cas_misses: AtomicUsize,
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        self.inner.insert(job).await
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self, filter: StateFilter) -> Result<Vec<Job>> {
        self.inner.list(filter).await
    }

    async fn claim_next_pending(&self, claimed_time: Timestamp) -> Result<Option<Job>> {
        self.inner.claim_next_pending(claimed_time).await
    }

    async fn update_from(&self, job: &Job, expected: JobState) -> Result<bool> {
        if self
            .cas_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(false);
        }
        self.inner.update_from(job, expected).await
    }
}

struct SequentialIds(AtomicU64);

impl IdProvider for SequentialIds {
    fn generate_id(&self) -> String {
        format!(
            "00000000-0000-4000-8000-{:012x}",
            self.0.fetch_add(1, Ordering::SeqCst)
        )
    }
}

/// Clock that advances one second per read, so every timestamp in a
/// test is distinct and ordered.
struct TickingClock(AtomicI64);

impl TimeProvider for TickingClock {
    fn now_micros(&self) -> Timestamp {
        self.0.fetch_add(1_000_000, Ordering::SeqCst)
    }
}

fn manager_with(store: Arc<dyn JobStore>) -> JobManager {
    JobManager::new(
        store,
        Arc::new(SequentialIds(AtomicU64::new(1))),
        Arc::new(TickingClock(AtomicI64::new(1_000_000))),
    )
}

fn manager() -> JobManager {
    manager_with(Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn create_then_status_is_pending() {
    let m = manager();

    let id = m.create("0.1.0").await.unwrap();
    let job = m.status(&id).await.unwrap();

    assert_eq!(job.id, id);
    assert_eq!(job.version, "0.1.0");
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.claimed_time, None);
    assert_eq!(job.finished_time, None);
    assert_eq!(job.last_heartbeat_time, None);
}

#[tokio::test]
async fn create_rejects_oversized_version() {
    let m = manager();
    let err = m.create(&"v".repeat(65)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn claim_on_empty_queue_returns_none() {
    let m = manager();
    assert!(m.claim().await.unwrap().is_none());
}

#[tokio::test]
async fn claim_pops_oldest_pending_first() {
    let m = manager();

    let first = m.create("0.1.0").await.unwrap();
    let second = m.create("0.1.0").await.unwrap();

    let job = m.claim().await.unwrap().unwrap();
    assert_eq!(job.id, first);
    assert_eq!(job.state, JobState::Running);
    assert!(job.claimed_time.is_some());

    let job = m.claim().await.unwrap().unwrap();
    assert_eq!(job.id, second);

    assert!(m.claim().await.unwrap().is_none());
}

#[tokio::test]
async fn heartbeat_updates_running_job() {
    let m = manager();

    let id = m.create("0.1.0").await.unwrap();
    assert!(m.status(&id).await.unwrap().last_heartbeat_time.is_none());

    // Not claimable yet
    let err = m.heartbeat(&id).await.unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));

    m.claim().await.unwrap().unwrap();
    let job = m.heartbeat(&id).await.unwrap();
    assert!(job.last_heartbeat_time.is_some());

    // Heartbeats keep moving forward
    let later = m.heartbeat(&id).await.unwrap();
    assert!(later.last_heartbeat_time > job.last_heartbeat_time);
}

#[tokio::test]
async fn complete_is_terminal() {
    let m = manager();

    let id = m.create("0.1.0").await.unwrap();

    // PENDING job cannot complete
    let err = m.complete(&id).await.unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));

    m.claim().await.unwrap().unwrap();
    let job = m.complete(&id).await.unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert!(job.finished_time.is_some());

    let err = m.complete(&id).await.unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));
}

#[tokio::test]
async fn cancel_pending_and_running() {
    let m = manager();

    let first = m.create("0.1.0").await.unwrap();
    let second = m.create("0.1.0").await.unwrap();

    // claim pops the older job, leaving `second` PENDING
    let claimed = m.claim().await.unwrap().unwrap();
    assert_eq!(claimed.id, first);

    let job = m.cancel(&first).await.unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert!(job.claimed_time.is_some());

    let job = m.cancel(&second).await.unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert!(job.claimed_time.is_none());

    // Terminal either way
    assert!(matches!(
        m.cancel(&first).await.unwrap_err(),
        AppError::Domain(_)
    ));
}

#[tokio::test]
async fn unknown_ids_surface_not_found() {
    let m = manager();
    let zero = "00000000-0000-0000-0000-000000000000".to_string();

    assert!(matches!(
        m.status(&zero).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        m.heartbeat(&zero).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        m.complete(&zero).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        m.cancel(&zero).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn list_filters_by_state() {
    let m = manager();

    let a = m.create("0.1.0").await.unwrap();
    let b = m.create("0.1.0").await.unwrap();
    let c = m.create("0.1.0").await.unwrap();

    m.claim().await.unwrap().unwrap(); // a -> RUNNING
    m.cancel(&c).await.unwrap(); // c -> FINISHED

    let active: Vec<JobId> = m
        .list(StateFilter::Active)
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(active, vec![a.clone(), b.clone()]);

    let pending: Vec<JobId> = m
        .list(StateFilter::Pending)
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(pending, vec![b]);

    let running: Vec<JobId> = m
        .list(StateFilter::Running)
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(running, vec![a]);
}

#[tokio::test]
async fn timestamps_are_monotone_across_the_lifecycle() {
    let m = manager();

    let id = m.create("0.1.0").await.unwrap();
    m.claim().await.unwrap().unwrap();
    m.heartbeat(&id).await.unwrap();
    let job = m.complete(&id).await.unwrap();

    let claimed = job.claimed_time.unwrap();
    let heartbeat = job.last_heartbeat_time.unwrap();
    let finished = job.finished_time.unwrap();
    assert!(job.created_time <= claimed);
    assert!(claimed <= heartbeat);
    assert!(heartbeat <= finished);
}

#[tokio::test]
async fn transition_retries_after_losing_a_cas() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        cas_misses: AtomicUsize::new(1),
    });
    let m = manager_with(store);

    let id = m.create("0.1.0").await.unwrap();

    // First CAS write is rejected; the retry re-reads and succeeds.
    let job = m.cancel(&id).await.unwrap();
    assert_eq!(job.state, JobState::Finished);
}

#[tokio::test]
async fn transition_gives_up_after_persistent_contention() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        cas_misses: AtomicUsize::new(usize::MAX),
    });
    let m = manager_with(store);

    let id = m.create("0.1.0").await.unwrap();
    let err = m.cancel(&id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
