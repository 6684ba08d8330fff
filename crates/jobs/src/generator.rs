// crates/jobs/src/generator.rs
//! Result generator seam.
//!
//! The terminal payload of a job is produced by a pluggable generator,
//! fully decoupled from the store and the sequencer. This is where real
//! domain computation would plug in; the built-ins here only echo the
//! job's own bookkeeping.

use crate::types::Job;

/// Produces a job's final payload at the terminal stage.
///
/// `Err(message)` marks the job `Failed` with that message; the error
/// never escapes the job record.
pub trait ResultGenerator: Send + Sync {
    fn generate(&self, job: &Job) -> Result<serde_json::Value, String>;
}

/// Plain closures work as generators.
impl<F> ResultGenerator for F
where
    F: Fn(&Job) -> Result<serde_json::Value, String> + Send + Sync,
{
    fn generate(&self, job: &Job) -> Result<serde_json::Value, String> {
        self(job)
    }
}

/// Default generator: a deterministic completion summary echoing the job's
/// identity and parameters.
#[derive(Debug, Default)]
pub struct CompletionSummary;

impl ResultGenerator for CompletionSummary {
    fn generate(&self, job: &Job) -> Result<serde_json::Value, String> {
        Ok(serde_json::json!({
            "jobId": job.id,
            "kind": job.kind,
            "parameters": job.parameters,
            "startedAt": job.created_at,
        }))
    }
}

/// Always fails with a fixed message. For tests and fault injection.
#[derive(Debug)]
pub struct FailingGenerator {
    message: String,
}

impl FailingGenerator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ResultGenerator for FailingGenerator {
    fn generate(&self, _job: &Job) -> Result<serde_json::Value, String> {
        Err(self.message.clone())
    }
}
