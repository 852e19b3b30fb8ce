use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::bail;
use crate::error::{ErrorKind, RelayResult};
use crate::task::{RunReport, Runnable};

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    finished: AtomicU64,
}

/// [`Runnable`] that sleeps for a fixed time per run and counts its runs.
#[derive(Debug, Clone)]
pub struct CountingTask {
    name: String,
    interval: Duration,
    run_time: Duration,
    fail: bool,
    counters: Arc<Counters>,
}

impl CountingTask {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            run_time: Duration::ZERO,
            fail: false,
            counters: Arc::default(),
        }
    }

    /// Makes every run take `run_time`.
    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    /// Makes every run return an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn started_runs(&self) -> u64 {
        self.counters.started.load(Ordering::SeqCst)
    }

    pub fn finished_runs(&self) -> u64 {
        self.counters.finished.load(Ordering::SeqCst)
    }
}

impl Runnable for CountingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> RelayResult<RunReport> {
        self.counters.started.fetch_add(1, Ordering::SeqCst);

        if !self.run_time.is_zero() {
            tokio::time::sleep(self.run_time).await;
        }

        self.counters.finished.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            bail!(ErrorKind::CheckpointReadFailed, "Injected run failure", self.name);
        }

        Ok(RunReport::new(DateTime::<Utc>::UNIX_EPOCH))
    }
}
