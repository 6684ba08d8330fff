// crates/jobs/src/types.rs
//! Types for the background job tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for a job. Opaque, assigned at creation, never reused.
pub type JobId = String;

/// Domain tag for a job. Only selects the stage plan and result generator —
/// the tracker itself treats every kind identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Training,
    Analysis,
    Download,
}

impl JobKind {
    /// All kinds, in registry order.
    pub const ALL: [JobKind; 3] = [JobKind::Training, JobKind::Analysis, JobKind::Download];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Training => "training",
            JobKind::Analysis => "analysis",
            JobKind::Download => "download",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(JobKind::Training),
            "analysis" => Ok(JobKind::Analysis),
            "download" => Ok(JobKind::Download),
            other => Err(format!("invalid job kind: {other}")),
        }
    }
}

/// Lifecycle status of a job.
///
/// Cancellation and timeout both surface as `Failed` with a descriptive
/// `error` string; there is no separate terminal variant for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the status admits no further progression.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A trackable unit of asynchronous work.
///
/// Mutated exclusively through [`JobStore::update`](crate::JobStore::update),
/// which enforces the invariants: progress never decreases, a terminal
/// transition happens at most once, and `result`/`error` are mutually
/// exclusive and present only when terminal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// 0–100, monotonically non-decreasing.
    pub progress: u8,
    /// Label of the stage in progress; `None` while `Pending`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on the transition into `Completed` or `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Caller-supplied, opaque to the tracker.
    pub parameters: serde_json::Value,
    /// Present iff `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Present iff `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cooperative cancellation flag, checked by the sequencer before each
    /// stage transition. Internal — not part of the wire shape.
    #[serde(skip)]
    pub cancel_requested: bool,
    /// Creation sequence number; tie-breaker for newest-first listing.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Job {
    pub(crate) fn new(id: JobId, kind: JobKind, parameters: serde_json::Value, seq: u64) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Pending,
            progress: 0,
            current_stage: None,
            created_at: Utc::now(),
            completed_at: None,
            parameters,
            result: None,
            error: None,
            cancel_requested: false,
            seq,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One named step in a job's execution sequence.
///
/// Configuration data consumed by the sequencer, not a runtime entity.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    /// Human-readable label written to `current_stage`.
    pub name: String,
    /// Simulated-or-real work budget; the sequencer's only suspension point.
    pub duration: Duration,
    /// Progress milestone written after the stage finishes (0–100).
    pub progress_after: u8,
}

impl StageDefinition {
    pub fn new(name: impl Into<String>, duration: Duration, progress_after: u8) -> Self {
        Self {
            name: name.into(),
            duration,
            progress_after,
        }
    }
}

/// Ordered stage sequence for one job kind.
pub type StagePlan = Vec<StageDefinition>;
