// crates/jobs/src/sequencer.rs
//! Drives a job through its configured stages.

use std::sync::Arc;

use crate::clock::JobClock;
use crate::generator::ResultGenerator;
use crate::store::{JobStore, StoreError};
use crate::types::{JobStatus, StageDefinition};

/// Error string written when cancellation is observed mid-run.
pub const CANCELLED_ERROR: &str = "cancelled";

/// Executes one job's stage plan, writing progress back into the store
/// after every stage and the terminal payload at the end.
///
/// Stages run strictly in order; the only suspension point is the injected
/// clock. Nothing here blocks the calling task — the tracker spawns one
/// `run` per job on the shared runtime.
pub struct StepSequencer {
    store: Arc<JobStore>,
    clock: Arc<dyn JobClock>,
}

impl StepSequencer {
    pub fn new(store: Arc<JobStore>, clock: Arc<dyn JobClock>) -> Self {
        Self { store, clock }
    }

    /// Run `plan` for the job, then invoke `generator` for the terminal
    /// payload.
    ///
    /// An empty plan goes straight to the generator and completes with
    /// progress 100. A `NotFound` mid-run means the job was evicted, which
    /// the store documents as cooperative cancellation — the run aborts
    /// silently. Any stage-level fault lands on the job record, never on
    /// the caller or on other jobs.
    pub async fn run(
        &self,
        job_id: &str,
        plan: &[StageDefinition],
        generator: &dyn ResultGenerator,
    ) {
        match self.store.update(job_id, |job| {
            job.status = JobStatus::Running;
            // The label always names the stage in progress, so the first
            // stage is visible for the whole time it runs.
            if let Some(first) = plan.first() {
                job.current_stage = Some(first.name.clone());
            }
        }) {
            Ok(job) if job.status == JobStatus::Running => {}
            Ok(job) => {
                // Already terminal before the first stage (e.g. swept).
                tracing::debug!(job_id = %job_id, status = ?job.status, "job terminal before start");
                return;
            }
            Err(StoreError::NotFound) => {
                tracing::debug!(job_id = %job_id, "job evicted before start");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "failed to start job");
                return;
            }
        }

        for (index, stage) in plan.iter().enumerate() {
            if self.cancelled_or_gone(job_id) {
                return;
            }

            self.clock.sleep(stage.duration).await;

            // Milestone for the finished stage, label for the one starting.
            // The last stage keeps its own label through completion.
            let next_name = plan.get(index + 1).map(|next| next.name.clone());
            match self.store.update(job_id, |job| {
                job.progress = stage.progress_after;
                if let Some(name) = next_name {
                    job.current_stage = Some(name);
                }
            }) {
                Ok(job) if job.is_terminal() => {
                    // Failed externally (timeout sweep) while we slept.
                    tracing::debug!(job_id = %job_id, status = ?job.status, "job terminated mid-run");
                    return;
                }
                Ok(_) => {}
                Err(StoreError::NotFound) => {
                    tracing::debug!(job_id = %job_id, "job evicted mid-run");
                    return;
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "stage update failed");
                    return;
                }
            }
        }

        if self.cancelled_or_gone(job_id) {
            return;
        }

        let Some(snapshot) = self.store.get(job_id) else {
            tracing::debug!(job_id = %job_id, "job evicted before result generation");
            return;
        };

        match generator.generate(&snapshot) {
            Ok(value) => {
                let outcome = self.store.update(job_id, |job| {
                    job.status = JobStatus::Completed;
                    job.progress = 100;
                    job.result = Some(value);
                });
                if outcome.is_ok() {
                    tracing::info!(job_id = %job_id, kind = %snapshot.kind, "job completed");
                }
            }
            Err(message) => {
                let outcome = self.store.update(job_id, |job| {
                    job.status = JobStatus::Failed;
                    job.error = Some(message.clone());
                });
                if outcome.is_ok() {
                    tracing::warn!(job_id = %job_id, kind = %snapshot.kind, error = %message, "job failed");
                }
            }
        }
    }

    /// Check the cancellation flag before a stage transition. Marks the job
    /// `Failed("cancelled")` when the flag is set.
    fn cancelled_or_gone(&self, job_id: &str) -> bool {
        let Some(job) = self.store.get(job_id) else {
            tracing::debug!(job_id = %job_id, "job evicted mid-run");
            return true;
        };
        if job.is_terminal() {
            return true;
        }
        if job.cancel_requested {
            let _ = self.store.update(job_id, |job| {
                job.status = JobStatus::Failed;
                job.error = Some(CANCELLED_ERROR.to_string());
            });
            tracing::info!(job_id = %job_id, "job cancelled");
            return true;
        }
        false
    }
}
