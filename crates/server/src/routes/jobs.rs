// crates/server/src/routes/jobs.rs
//! API routes for background job management.
//!
//! - POST /jobs — Create a job and schedule its run
//! - GET  /jobs — Status of one job (`?jobId=`) or the full list, newest first
//! - POST /jobs/{id}/cancel — Request cooperative cancellation

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use aurora_jobs::{Job, JobKind};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/jobs request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// `"training"`, `"analysis"`, or `"download"`. Parsed as a string so an
    /// unknown kind produces a 400 envelope instead of a deserializer reject.
    pub kind: String,
    /// Domain-specific parameters, opaque to the tracker.
    #[serde(default = "empty_parameters")]
    pub parameters: serde_json::Value,
}

fn empty_parameters() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// POST /api/jobs response envelope.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Envelope for a single-job status response.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

/// Envelope for the job list, newest first.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

/// POST /api/jobs — create a job of the requested kind.
async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<CreateJobResponse>)> {
    let kind: JobKind = match request.kind.parse() {
        Ok(kind) => kind,
        Err(message) => {
            tracing::warn!(kind = %request.kind, "rejected job creation");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(CreateJobResponse {
                    success: false,
                    job_id: None,
                    error: Some(message),
                }),
            ));
        }
    };

    let job = state
        .tracker
        .start(kind, request.parameters)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(CreateJobResponse {
            success: true,
            job_id: Some(job.id),
            error: None,
        }),
    ))
}

/// GET /api/jobs — one job by `?jobId=`, or all jobs newest-first.
async fn job_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Response> {
    match query.job_id {
        Some(id) => {
            let job = state
                .tracker
                .get(&id)
                .ok_or(ApiError::JobNotFound(id))?;
            Ok(Json(JobResponse { success: true, job }).into_response())
        }
        None => Ok(Json(JobListResponse {
            success: true,
            jobs: state.tracker.list(),
        })
        .into_response()),
    }
}

/// POST /api/jobs/{id}/cancel — request cooperative cancellation.
///
/// Cancelling a terminal job is a no-op; the current snapshot is returned
/// either way.
async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state
        .tracker
        .cancel(&id)
        .map_err(|_| ApiError::JobNotFound(id))?;
    Ok(Json(JobResponse { success: true, job }))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job).get(job_status))
        .route("/jobs/{id}/cancel", post(cancel_job))
}
