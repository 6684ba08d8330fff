//! API route handlers for the aurora server.

pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/jobs - Create a job
/// - GET  /api/jobs - Job status by ?jobId= or full list, newest first
/// - POST /api/jobs/{id}/cancel - Request cooperative cancellation
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router().merge(jobs::router()))
        .with_state(state)
}
