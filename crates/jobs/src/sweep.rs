// crates/jobs/src/sweep.rs
//! Retention sweep: bounds store memory and enforces the job timeout.
//!
//! The sequencer never times its own job out — an external sweep does,
//! which keeps the sequencer simple and the timeout testable. The sweep is
//! a pure function of an injected `now`; the server binary drives it on an
//! interval.

use chrono::{DateTime, Duration, Utc};

use crate::store::JobStore;
use crate::types::JobStatus;

/// Error string written when the sweep force-fails an overdue job.
pub const TIMED_OUT_ERROR: &str = "timed out";

/// Age limits applied by [`sweep`].
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Terminal jobs older than this (by `completed_at`) are evicted.
    pub max_terminal_age: Duration,
    /// Jobs not terminal within this window (by `created_at`) are
    /// force-failed.
    pub max_running: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_terminal_age: Duration::hours(1),
            max_running: Duration::minutes(10),
        }
    }
}

/// What one sweep pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub evicted: usize,
    pub timed_out: usize,
}

/// Apply `policy` to every job in the store as of `now`.
pub fn sweep(store: &JobStore, policy: &RetentionPolicy, now: DateTime<Utc>) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();

    for job in store.list() {
        if job.is_terminal() {
            let expired = job
                .completed_at
                .is_some_and(|done| done + policy.max_terminal_age <= now);
            if expired && store.remove(&job.id).is_some() {
                outcome.evicted += 1;
            }
        } else if job.created_at + policy.max_running <= now {
            let result = store.update(&job.id, |j| {
                j.status = JobStatus::Failed;
                j.error = Some(TIMED_OUT_ERROR.to_string());
            });
            if result.is_ok() {
                tracing::warn!(job_id = %job.id, kind = %job.kind, "job timed out");
                outcome.timed_out += 1;
            }
        }
    }

    if outcome.evicted > 0 || outcome.timed_out > 0 {
        tracing::info!(
            evicted = outcome.evicted,
            timed_out = outcome.timed_out,
            remaining = store.len(),
            "retention sweep"
        );
    }
    outcome
}
