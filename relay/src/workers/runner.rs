use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, info_span};

use crate::bail;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, RelayError, RelayResult};
use crate::task::Runnable;
use crate::workers::base::{Worker, WorkerHandle};

/// Counters describing what a runner has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskRunnerState {
    /// Task runs that completed, successfully or not.
    pub runs: u64,
    /// Task runs that returned an error.
    pub failed_runs: u64,
}

#[derive(Debug)]
pub struct TaskRunnerHandle {
    state_rx: watch::Receiver<TaskRunnerState>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle<TaskRunnerState> for TaskRunnerHandle {
    fn state(&self) -> TaskRunnerState {
        *self.state_rx.borrow()
    }

    async fn wait(mut self) -> RelayResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.await.map_err(|err| {
            let detail = if err.is_panic() {
                "task runner panicked".to_string()
            } else {
                err.to_string()
            };
            RelayError::from((ErrorKind::TaskRunnerPanic, "Task runner failed", detail))
        })
    }
}

/// Drives a [`Runnable`] on its interval until shutdown is signaled.
///
/// The task runs once right away and then on every tick. Runs of the same task
/// never overlap: a slow run delays the next tick. Shutdown is observed between
/// runs, so a run in progress always completes.
#[derive(Debug)]
pub struct TaskRunner<T> {
    task: Arc<T>,
    shutdown_rx: ShutdownRx,
}

impl<T> TaskRunner<T>
where
    T: Runnable,
{
    pub fn new(task: Arc<T>, shutdown_rx: ShutdownRx) -> Self {
        Self { task, shutdown_rx }
    }
}

impl<T> Worker<TaskRunnerHandle, TaskRunnerState> for TaskRunner<T>
where
    T: Runnable,
{
    type Error = RelayError;

    async fn start(self) -> Result<TaskRunnerHandle, Self::Error> {
        let period = self.task.interval();
        if period.is_zero() {
            bail!(
                ErrorKind::ConfigError,
                "Task interval must be greater than zero",
                self.task.name()
            );
        }

        info!(
            task = self.task.name(),
            interval_ms = period.as_millis() as u64,
            "starting task runner"
        );

        let (state_tx, state_rx) = watch::channel(TaskRunnerState::default());
        let span = info_span!("task_runner", task = self.task.name());
        let handle =
            tokio::spawn(run_loop(self.task, self.shutdown_rx, period, state_tx).instrument(span));

        Ok(TaskRunnerHandle {
            state_rx,
            handle: Some(handle),
        })
    }
}

async fn run_loop<T: Runnable>(
    task: Arc<T>,
    mut shutdown_rx: ShutdownRx,
    period: Duration,
    state_tx: watch::Sender<TaskRunnerState>,
) {
    if shutdown_rx.is_shutdown() {
        info!("shutdown signaled before the first run");
        return;
    }

    run_once(task.as_ref(), &state_tx).await;

    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.wait() => {
                info!("shutting down task runner");
                break;
            }

            _ = interval.tick() => {
                run_once(task.as_ref(), &state_tx).await;
            }
        }
    }
}

async fn run_once<T: Runnable>(task: &T, state_tx: &watch::Sender<TaskRunnerState>) {
    let result = task
        .execute()
        .instrument(info_span!("task_run", task = task.name()))
        .await;

    state_tx.send_modify(|state| {
        state.runs += 1;
        if result.is_err() {
            state.failed_runs += 1;
        }
    });

    match result {
        Ok(report) => debug!(
            rows = report.rows,
            failed_rows = report.failed_rows(),
            "task run finished"
        ),
        Err(err) => error!(error = %err, "task run failed"),
    }
}
