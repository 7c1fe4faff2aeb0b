//! HTTP Handlers
//!
//! Thin layer: extract, call the JobManager, encode. Body rejections
//! collapse to 400 so a malformed or incomplete JSON body never leaks
//! an extractor-specific status.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use jobqueue_core::application::JobManager;
use jobqueue_core::error::AppError;

use crate::error::ApiError;
use crate::types::{JobIdResponse, JobRecord, ListQuery, NewJobRequest};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
}

/// POST /0.1.0/job/new
pub async fn new_job(
    State(state): State<AppState>,
    body: Result<Json<NewJobRequest>, JsonRejection>,
) -> Result<Json<JobIdResponse>, ApiError> {
    let Json(req) =
        body.map_err(|e| AppError::Validation(format!("Bad request body: {}", e)))?;

    let job_id = state.manager.create(&req.version).await?;
    Ok(Json(JobIdResponse { job_id }))
}

/// GET /0.1.0/jobs[?state=PENDING|RUNNING]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobRecord>>, ApiError> {
    let filter = query.filter()?;
    let jobs = state.manager.list(filter).await?;
    Ok(Json(jobs.into_iter().map(JobRecord::from).collect()))
}

/// POST /0.1.0/job/claim - 404 when nothing is pending.
pub async fn claim_job(
    State(state): State<AppState>,
) -> Result<Json<JobIdResponse>, ApiError> {
    let job = state
        .manager
        .claim()
        .await?
        .ok_or_else(|| AppError::NotFound("No pending jobs".to_string()))?;

    Ok(Json(JobIdResponse { job_id: job.id }))
}

/// GET /0.1.0/job/:job_id/status
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    let job = state.manager.status(&job_id).await?;
    Ok(Json(JobRecord::from(job)))
}

/// POST /0.1.0/job/:job_id/heartbeat
pub async fn job_heartbeat(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.heartbeat(&job_id).await?;
    Ok(StatusCode::OK)
}

/// POST /0.1.0/job/:job_id/complete
pub async fn job_complete(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.complete(&job_id).await?;
    Ok(StatusCode::OK)
}

/// POST /0.1.0/job/:job_id/cancel
pub async fn job_cancel(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.cancel(&job_id).await?;
    Ok(StatusCode::OK)
}
