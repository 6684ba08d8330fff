// crates/jobs/src/lib.rs
//! Background job tracker for the aurora exploration platform.
//!
//! Provides:
//! - [`JobStore`] — in-memory job registry with per-job write serialization
//! - [`StepSequencer`] — drives a job through its configured stages
//! - [`JobTracker`] — façade: create, spawn, poll, cancel
//! - [`ResultGenerator`] — pluggable terminal-payload seam
//! - [`sweep`] — retention/timeout sweep bounding store memory
//!
//! Clients poll [`JobTracker::get`] until the job reaches a terminal state;
//! there is no server push. Stage timing goes through the injectable
//! [`JobClock`] so tests run whole plans without elapsed time.

pub mod clock;
pub mod generator;
pub mod kinds;
pub mod sequencer;
pub mod store;
pub mod sweep;
pub mod tracker;
pub mod types;

pub use clock::{JobClock, ManualClock, TokioClock};
pub use generator::{CompletionSummary, FailingGenerator, ResultGenerator};
pub use kinds::{default_plan, KindConfig, KindRegistry};
pub use sequencer::{StepSequencer, CANCELLED_ERROR};
pub use store::{JobStore, StoreError};
pub use sweep::{sweep, RetentionPolicy, SweepOutcome, TIMED_OUT_ERROR};
pub use tracker::JobTracker;
pub use types::{Job, JobId, JobKind, JobStatus, StageDefinition, StagePlan};
