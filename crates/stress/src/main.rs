//! Jobqueue Stress Client
//!
//! Drives a running daemon with one paced submitter and a pool of
//! polling workers, then waits for the active job list to drain.

mod shutdown;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

use crate::shutdown::{shutdown_channel, ShutdownToken};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
const IDLE_RETRY: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "jobqueue-stress")]
#[command(about = "Stress-test client for the jobqueue daemon", long_about = None)]
#[command(version)]
struct Args {
    /// URL of job queue server
    #[arg(default_value = "http://localhost:8314")]
    url: String,

    /// Number of jobs to submit
    #[arg(long, default_value_t = 10)]
    num_jobs: u32,

    /// Delay (in seconds) between submitting jobs
    #[arg(long, default_value_t = 1)]
    job_submit_delay: u64,

    /// Number of worker tasks to start
    #[arg(long, default_value_t = 1)]
    num_workers: u32,

    /// Duration (in seconds) of a worker's simulated task
    #[arg(long, default_value_t = 5)]
    worker_duration: u64,
}

#[derive(Deserialize)]
struct JobIdResponse {
    job_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let base = args.url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let submitter_handle = tokio::spawn(submitter(
        client.clone(),
        base.clone(),
        args.num_jobs,
        Duration::from_secs(args.job_submit_delay),
    ));

    let mut workers = Vec::new();
    for _ in 0..args.num_workers {
        workers.push(tokio::spawn(worker(
            client.clone(),
            base.clone(),
            Duration::from_secs(args.worker_duration),
            shutdown_rx.clone(),
        )));
    }

    submitter_handle
        .await
        .context("submitter task panicked")??;

    // Hold the workers until everything submitted has been worked off
    let poll_interval = Duration::from_secs(args.worker_duration.max(1));
    while jobs_remaining(&client, &base).await? > 0 {
        tokio::time::sleep(poll_interval).await;
    }
    shutdown_tx.shutdown();

    let mut completed = 0;
    for handle in workers {
        completed += handle.await.context("worker task panicked")??;
    }

    println!(
        "all {} jobs drained, workers completed {}",
        args.num_jobs, completed
    );
    Ok(())
}

async fn submitter(
    client: reqwest::Client,
    base: String,
    count: u32,
    delay: Duration,
) -> Result<()> {
    for n in 1..=count {
        let resp = client
            .post(format!("{}/0.1.0/job/new", base))
            .json(&json!({ "version": "0.1.0" }))
            .send()
            .await
            .context("job submission failed")?
            .error_for_status()
            .context("job submission rejected")?;

        let JobIdResponse { job_id } = resp.json().await?;
        println!("submitted job {} ({}/{})", job_id, n, count);

        tokio::time::sleep(delay).await;
    }
    Ok(())
}

/// Claim, simulate work with periodic heartbeats, complete; poll again
/// after a short pause when nothing is claimable.
async fn worker(
    client: reqwest::Client,
    base: String,
    duration: Duration,
    token: ShutdownToken,
) -> Result<u32> {
    let mut completed = 0;

    while !token.is_shutdown() {
        let resp = client
            .post(format!("{}/0.1.0/job/claim", base))
            .send()
            .await
            .context("claim request failed")?;

        if !resp.status().is_success() {
            // Queue is empty right now
            tokio::time::sleep(IDLE_RETRY).await;
            continue;
        }

        let JobIdResponse { job_id } = resp.json().await?;

        let started = Instant::now();
        while let Some(remaining) = duration.checked_sub(started.elapsed()) {
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining.min(HEARTBEAT_INTERVAL)).await;

            let _ = client
                .post(format!("{}/0.1.0/job/{}/heartbeat", base, job_id))
                .send()
                .await;
        }

        client
            .post(format!("{}/0.1.0/job/{}/complete", base, job_id))
            .send()
            .await
            .context("complete request failed")?
            .error_for_status()
            .context("complete rejected")?;

        completed += 1;
    }

    Ok(completed)
}

async fn jobs_remaining(client: &reqwest::Client, base: &str) -> Result<usize> {
    let resp = client
        .get(format!("{}/0.1.0/jobs", base))
        .send()
        .await
        .context("jobs listing failed")?
        .error_for_status()
        .context("jobs listing rejected")?;

    let jobs: Vec<serde_json::Value> = resp.json().await?;
    Ok(jobs.len())
}
