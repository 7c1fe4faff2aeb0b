//! Durability: committed job state survives a daemon restart.

use std::sync::Arc;

use jobqueue_core::application::JobManager;
use jobqueue_core::domain::{JobState, StateFilter};
use jobqueue_core::port::id_provider::UuidProvider;
use jobqueue_core::port::time_provider::SystemTimeProvider;
use jobqueue_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};

async fn manager_for(db_path: &str) -> JobManager {
    let pool = create_pool(db_path).await.unwrap();
    run_migrations(&pool).await.unwrap();
    JobManager::new(
        Arc::new(SqliteJobStore::new(pool)),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )
}

#[tokio::test]
async fn jobs_survive_restart() {
    let db_path = "/tmp/jobqueue_persistence_restart.db";
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
    }

    let pending;
    let running;
    let cancelled;

    // First process lifetime: build up state, then drop everything
    {
        let manager = manager_for(db_path).await;

        let first = manager.create("0.1.0").await.unwrap();
        pending = manager.create("0.1.0").await.unwrap();
        cancelled = manager.create("0.1.0").await.unwrap();

        let claimed = manager.claim().await.unwrap().unwrap();
        assert_eq!(claimed.id, first);
        running = first;

        manager.heartbeat(&running).await.unwrap();
        manager.cancel(&cancelled).await.unwrap();
    }

    // Second process lifetime: same database, fresh pool
    {
        let manager = manager_for(db_path).await;

        let job = manager.status(&pending).await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert!(job.claimed_time.is_none());

        let job = manager.status(&running).await.unwrap();
        assert_eq!(job.state, JobState::Running);
        assert!(job.claimed_time.is_some());
        assert!(job.last_heartbeat_time.is_some());

        let job = manager.status(&cancelled).await.unwrap();
        assert_eq!(job.state, JobState::Finished);
        assert!(job.finished_time.is_some());

        // Active listing picks up where the last process left off
        let active = manager.list(StateFilter::Active).await.unwrap();
        let ids: Vec<String> = active.into_iter().map(|j| j.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&pending));
        assert!(ids.contains(&running));

        // And the surviving PENDING job is still claimable
        let claimed = manager.claim().await.unwrap().unwrap();
        assert_eq!(claimed.id, pending);
    }

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
    }
}
