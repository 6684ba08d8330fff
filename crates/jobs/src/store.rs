// crates/jobs/src/store.rs
//! In-memory job registry with per-job write serialization.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use uuid::Uuid;

use crate::types::{Job, JobId, JobKind};

/// How many fresh ids to try before declaring the id space exhausted.
/// Unreachable with uuid-v4 ids; reachable in tests with a constrained source.
const MAX_ID_ATTEMPTS: usize = 8;

/// Errors surfaced by the store. Domain failures (generator errors,
/// cancellation, timeout) live on the job record instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Job not found")]
    NotFound,
    #[error("job id space exhausted after {0} attempts")]
    IdSpaceExhausted(usize),
}

type IdSource = Box<dyn Fn() -> JobId + Send + Sync>;

/// Single source of truth for job records.
///
/// Two-level locking: an outer `RwLock` guards the id map for lookup and
/// insertion, an inner per-job `RwLock` serializes writes to one record.
/// Unrelated jobs never contend, readers see whole snapshots (never torn),
/// and no lock is held across an await point.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<RwLock<Job>>>>,
    next_seq: AtomicU64,
    id_source: IdSource,
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_id_source(|| format!("job_{}", Uuid::new_v4().simple()))
    }

    /// Create a store with a custom id source. Lets tests constrain the id
    /// space to exercise collision handling and exhaustion.
    pub fn with_id_source(id_source: impl Fn() -> JobId + Send + Sync + 'static) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            id_source: Box::new(id_source),
        }
    }

    /// Insert a new `Pending` job and return its snapshot.
    ///
    /// Regenerates the id on collision; fails with
    /// [`StoreError::IdSpaceExhausted`] only when the source keeps colliding.
    pub fn create(&self, kind: JobKind, parameters: serde_json::Value) -> Result<Job, StoreError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let mut jobs = match self.jobs.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("RwLock poisoned writing jobs map: {e}");
                e.into_inner()
            }
        };

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.id_source)();
            match jobs.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let job = Job::new(id, kind, parameters, seq);
                    slot.insert(Arc::new(RwLock::new(job.clone())));
                    return Ok(job);
                }
            }
        }

        Err(StoreError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Point-in-time snapshot of one job. O(1), safe to poll at any rate.
    pub fn get(&self, id: &str) -> Option<Job> {
        let slot = self.slot(id)?;
        Some(read_snapshot(&slot))
    }

    /// Apply a mutation under the job's write lock and return the resulting
    /// snapshot.
    ///
    /// Jobs already in a terminal state are immutable: the mutator is not
    /// run, the current state is returned, and the attempt is logged as a
    /// programming-error signal.
    ///
    /// Post-conditions enforced here regardless of what the mutator wrote:
    /// progress never decreases, and `completed_at` is stamped exactly once
    /// when the status becomes terminal.
    pub fn update(&self, id: &str, mutate: impl FnOnce(&mut Job)) -> Result<Job, StoreError> {
        let slot = self.slot(id).ok_or(StoreError::NotFound)?;
        let mut job = match slot.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(job_id = %id, "RwLock poisoned writing job: {e}");
                e.into_inner()
            }
        };

        if job.is_terminal() {
            tracing::warn!(job_id = %id, status = ?job.status, "update on terminal job ignored");
            return Ok(job.clone());
        }

        let progress_before = job.progress;
        mutate(&mut job);

        if job.progress < progress_before {
            tracing::warn!(
                job_id = %id,
                before = progress_before,
                after = job.progress,
                "progress regression clamped"
            );
            job.progress = progress_before;
        }
        if job.is_terminal() && job.completed_at.is_none() {
            job.completed_at = Some(chrono::Utc::now());
        }

        Ok(job.clone())
    }

    /// Request cooperative cancellation. No-op on terminal jobs.
    /// Returns the current snapshot either way.
    pub fn cancel(&self, id: &str) -> Result<Job, StoreError> {
        let slot = self.slot(id).ok_or(StoreError::NotFound)?;
        let mut job = match slot.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(job_id = %id, "RwLock poisoned cancelling job: {e}");
                e.into_inner()
            }
        };
        if !job.is_terminal() {
            job.cancel_requested = true;
        }
        Ok(job.clone())
    }

    /// Snapshot of every job, newest first by `created_at` (creation
    /// sequence breaks same-instant ties).
    pub fn list(&self) -> Vec<Job> {
        let slots: Vec<Arc<RwLock<Job>>> = match self.jobs.read() {
            Ok(jobs) => jobs.values().cloned().collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                e.into_inner().values().cloned().collect()
            }
        };
        let mut jobs: Vec<Job> = slots.iter().map(|s| read_snapshot(s)).collect();
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        jobs
    }

    /// Evict a job. Used by the retention sweep; a sequencer still running
    /// against the evicted id treats the resulting `NotFound` as cooperative
    /// cancellation and aborts silently.
    pub fn remove(&self, id: &str) -> Option<Job> {
        let slot = match self.jobs.write() {
            Ok(mut jobs) => jobs.remove(id),
            Err(e) => {
                tracing::error!("RwLock poisoned removing job: {e}");
                e.into_inner().remove(id)
            }
        }?;
        Some(read_snapshot(&slot))
    }

    pub fn len(&self) -> usize {
        match self.jobs.read() {
            Ok(jobs) => jobs.len(),
            Err(e) => e.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &str) -> Option<Arc<RwLock<Job>>> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                e.into_inner().get(id).cloned()
            }
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_snapshot(slot: &Arc<RwLock<Job>>) -> Job {
    match slot.read() {
        Ok(job) => job.clone(),
        Err(e) => {
            tracing::error!("RwLock poisoned reading job: {e}");
            e.into_inner().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_create_then_get_is_pending() {
        let store = JobStore::new();
        let job = store.create(JobKind::Training, json!({})).unwrap();

        let got = store.get(&job.id).unwrap();
        assert_eq!(got.status, JobStatus::Pending);
        assert_eq!(got.progress, 0);
        assert_eq!(got.current_stage, None);
        assert_eq!(got.completed_at, None);
    }

    #[test]
    fn test_get_unknown_id_no_side_effects() {
        let store = JobStore::new();
        store.create(JobKind::Analysis, json!({})).unwrap();

        assert!(store.get("job_does_not_exist").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = JobStore::new();
        let err = store.update("nope", |j| j.progress = 50).unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[test]
    fn test_update_applies_and_returns_snapshot() {
        let store = JobStore::new();
        let job = store.create(JobKind::Download, json!({})).unwrap();

        let updated = store
            .update(&job.id, |j| {
                j.status = JobStatus::Running;
                j.progress = 30;
                j.current_stage = Some("Downloading".into());
            })
            .unwrap();

        assert_eq!(updated.status, JobStatus::Running);
        assert_eq!(updated.progress, 30);
        assert_eq!(store.get(&job.id).unwrap().progress, 30);
    }

    #[test]
    fn test_progress_never_decreases() {
        let store = JobStore::new();
        let job = store.create(JobKind::Training, json!({})).unwrap();

        store.update(&job.id, |j| j.progress = 70).unwrap();
        let after = store.update(&job.id, |j| j.progress = 40).unwrap();
        assert_eq!(after.progress, 70);
    }

    #[test]
    fn test_terminal_job_is_immutable() {
        let store = JobStore::new();
        let job = store.create(JobKind::Training, json!({})).unwrap();

        let done = store
            .update(&job.id, |j| {
                j.status = JobStatus::Completed;
                j.progress = 100;
                j.result = Some(json!({"ok": true}));
            })
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        let completed_at = done.completed_at.expect("stamped on terminal transition");

        // A later write attempt changes nothing.
        let after = store
            .update(&job.id, |j| {
                j.status = JobStatus::Failed;
                j.error = Some("late failure".into());
                j.progress = 0;
            })
            .unwrap();
        assert_eq!(after.status, JobStatus::Completed);
        assert_eq!(after.progress, 100);
        assert_eq!(after.result, Some(json!({"ok": true})));
        assert_eq!(after.error, None);
        assert_eq!(after.completed_at, Some(completed_at));
    }

    #[test]
    fn test_completed_at_stamped_once() {
        let store = JobStore::new();
        let job = store.create(JobKind::Analysis, json!({})).unwrap();

        let failed = store
            .update(&job.id, |j| {
                j.status = JobStatus::Failed;
                j.error = Some("boom".into());
            })
            .unwrap();
        assert!(failed.completed_at.is_some());
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert_eq!(failed.result, None);
    }

    #[test]
    fn test_cancel_sets_flag_until_terminal() {
        let store = JobStore::new();
        let job = store.create(JobKind::Download, json!({})).unwrap();

        let cancelled = store.cancel(&job.id).unwrap();
        assert!(cancelled.cancel_requested);

        store
            .update(&job.id, |j| {
                j.status = JobStatus::Failed;
                j.error = Some("cancelled".into());
            })
            .unwrap();

        // Cancelling a terminal job is a no-op returning the snapshot.
        let again = store.cancel(&job.id).unwrap();
        assert_eq!(again.status, JobStatus::Failed);
    }

    #[test]
    fn test_cancel_unknown_id() {
        let store = JobStore::new();
        assert_eq!(store.cancel("nope").unwrap_err(), StoreError::NotFound);
    }

    #[test]
    fn test_list_newest_first() {
        let store = JobStore::new();
        let a = store.create(JobKind::Training, json!({})).unwrap();
        let b = store.create(JobKind::Analysis, json!({})).unwrap();
        let c = store.create(JobKind::Download, json!({})).unwrap();

        let ids: Vec<JobId> = store.list().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_remove_evicts() {
        let store = JobStore::new();
        let job = store.create(JobKind::Training, json!({})).unwrap();

        assert!(store.remove(&job.id).is_some());
        assert!(store.get(&job.id).is_none());
        assert!(store.is_empty());
        assert!(store.remove(&job.id).is_none());
    }

    #[test]
    fn test_collision_regenerates_id() {
        // Source yields a duplicate once, then unique ids.
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let store = JobStore::with_id_source(move || {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            // 0 and 1 collide; everything after is unique.
            format!("job_{}", n.saturating_sub(1))
        });

        let first = store.create(JobKind::Training, json!({})).unwrap();
        let second = store.create(JobKind::Training, json!({})).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_id_space_exhaustion() {
        let store = JobStore::with_id_source(|| "job_only".to_string());

        store.create(JobKind::Training, json!({})).unwrap();
        let err = store.create(JobKind::Training, json!({})).unwrap_err();
        assert!(matches!(err, StoreError::IdSpaceExhausted(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_updates_to_distinct_jobs() {
        let store = std::sync::Arc::new(JobStore::new());
        let a = store.create(JobKind::Training, json!({})).unwrap();
        let b = store.create(JobKind::Download, json!({})).unwrap();

        let handles: Vec<_> = [a.id.clone(), b.id.clone()]
            .into_iter()
            .map(|id| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for p in 1..=100u8 {
                        store.update(&id, |j| j.progress = p).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get(&a.id).unwrap().progress, 100);
        assert_eq!(store.get(&b.id).unwrap().progress, 100);
    }
}
