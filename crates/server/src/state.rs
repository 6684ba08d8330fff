// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use aurora_jobs::JobTracker;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// The job tracker: create, poll, cancel.
    pub tracker: Arc<JobTracker>,
}

impl AppState {
    /// Create application state wrapped in an Arc for sharing.
    pub fn new(tracker: Arc<JobTracker>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            tracker,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
