// crates/jobs/src/tracker.rs
//! Façade tying the store, sequencer, and kind registry together.

use std::sync::Arc;

use crate::clock::{JobClock, TokioClock};
use crate::kinds::KindRegistry;
use crate::sequencer::StepSequencer;
use crate::store::{JobStore, StoreError};
use crate::types::{Job, JobKind};

/// Creates jobs, spawns their sequencer runs, and answers polls.
///
/// One instance per process, constructed at startup and shared by
/// reference — there is no ambient global store.
pub struct JobTracker {
    store: Arc<JobStore>,
    clock: Arc<dyn JobClock>,
    registry: KindRegistry,
}

impl JobTracker {
    /// Tracker with a fresh store, the real tokio clock, and default
    /// per-kind plans.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(JobStore::new()),
            Arc::new(TokioClock),
            KindRegistry::with_defaults(),
        )
    }

    /// Fully injected constructor, used by tests and by callers that swap
    /// plans, generators, or the clock.
    pub fn with_parts(
        store: Arc<JobStore>,
        clock: Arc<dyn JobClock>,
        registry: KindRegistry,
    ) -> Self {
        Self {
            store,
            clock,
            registry,
        }
    }

    /// Create a job and schedule its run. Returns the `Pending` snapshot
    /// immediately; progression happens on the shared runtime.
    pub fn start(&self, kind: JobKind, parameters: serde_json::Value) -> Result<Job, StoreError> {
        let job = self.store.create(kind, parameters)?;

        let config = match self.registry.config(kind) {
            Some(config) => config,
            None => {
                // Defensive fallback; with_defaults covers every kind.
                tracing::warn!(kind = %kind, "no registered plan, completing immediately");
                crate::kinds::KindConfig {
                    plan: Vec::new(),
                    generator: Arc::new(crate::generator::CompletionSummary),
                }
            }
        };

        let sequencer = StepSequencer::new(Arc::clone(&self.store), Arc::clone(&self.clock));
        let job_id = job.id.clone();
        tokio::spawn(async move {
            sequencer
                .run(&job_id, &config.plan, config.generator.as_ref())
                .await;
        });

        tracing::info!(job_id = %job.id, kind = %kind, "job started");
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.store.get(id)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        self.store.list()
    }

    /// Request cooperative cancellation; the sequencer observes the flag
    /// before its next stage transition.
    pub fn cancel(&self, id: &str) -> Result<Job, StoreError> {
        self.store.cancel(id)
    }

    /// Shared store handle, used by the retention sweep.
    pub fn store(&self) -> Arc<JobStore> {
        Arc::clone(&self.store)
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
