// crates/jobs/src/clock.rs
//! Injectable suspension point for stage timing.
//!
//! The sequencer never calls `tokio::time::sleep` directly — it goes through
//! [`JobClock`] so tests can run whole stage plans without elapsed time.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// A schedulable delay. The only suspension point in the core.
pub trait JobClock: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioClock;

impl JobClock for TokioClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test clock: completes immediately and records every requested delay.
#[derive(Debug, Default)]
pub struct ManualClock {
    slept: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        match self.slept.lock() {
            Ok(guard) => guard.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    pub fn sleep_count(&self) -> usize {
        self.slept().len()
    }
}

impl JobClock for ManualClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        match self.slept.lock() {
            Ok(mut guard) => guard.push(duration),
            Err(e) => e.into_inner().push(duration),
        }
        Box::pin(std::future::ready(()))
    }
}
