//! Runs a set of polling tasks side by side until shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::bail;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::{ErrorKind, RelayResult};
use crate::metrics::register_metrics;
use crate::task::Runnable;
use crate::workers::base::{Worker, WorkerHandle};
use crate::workers::runner::{TaskRunner, TaskRunnerHandle, TaskRunnerState};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started { runners: Vec<(String, TaskRunnerHandle)> },
}

/// Owns every task of the process and one [`TaskRunner`] per task.
///
/// Tasks run concurrently with each other and share nothing but the clients
/// they were built with. A single [`ShutdownTx`] stops all of them.
#[derive(Debug)]
pub struct Pipeline<T> {
    tasks: Vec<Arc<T>>,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<T> Pipeline<T>
where
    T: Runnable,
{
    /// Creates a pipeline over `tasks`.
    ///
    /// Fails when two tasks share a name, since the name keys the checkpoint.
    pub fn new(tasks: Vec<T>) -> RelayResult<Self> {
        register_metrics();

        let mut names = HashSet::new();
        for task in &tasks {
            if !names.insert(task.name().to_owned()) {
                bail!(
                    ErrorKind::ConfigError,
                    "Duplicate task name",
                    task.name()
                );
            }
        }

        let (shutdown_tx, _) = create_shutdown_channel();

        Ok(Self {
            tasks: tasks.into_iter().map(Arc::new).collect(),
            state: PipelineState::NotStarted,
            shutdown_tx,
        })
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.name())
    }

    /// Starts one runner per task. Calling it on a started pipeline fails.
    pub async fn start(&mut self) -> RelayResult<()> {
        if let PipelineState::Started { .. } = self.state {
            bail!(ErrorKind::InvalidState, "Pipeline already started");
        }

        info!(tasks = self.tasks.len(), "starting pipeline");

        let mut runners = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let handle = TaskRunner::new(task.clone(), self.shutdown_tx.subscribe())
                .start()
                .await?;
            runners.push((task.name().to_owned(), handle));
        }

        self.state = PipelineState::Started { runners };

        Ok(())
    }

    /// Per task runner counters, empty before [`Pipeline::start`].
    pub fn runner_states(&self) -> Vec<(String, TaskRunnerState)> {
        match &self.state {
            PipelineState::NotStarted => vec![],
            PipelineState::Started { runners } => runners
                .iter()
                .map(|(name, handle)| (name.clone(), handle.state()))
                .collect(),
        }
    }

    /// Waits for every runner to return, which happens after shutdown.
    ///
    /// Errors of individual runners are collected and returned together.
    pub async fn wait(self) -> RelayResult<()> {
        let PipelineState::Started { runners } = self.state else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(());
        };

        let mut errors = vec![];
        for (name, handle) in runners {
            if let Err(err) = handle.wait().await {
                info!(task = %name, error = %err, "task runner stopped with an error");
                errors.push(err);
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        info!("all task runners stopped");

        Ok(())
    }

    /// Signals every runner to stop after its current run.
    pub fn shutdown(&self) {
        info!("shutting down the pipeline");
        self.shutdown_tx.shutdown();
    }

    pub async fn shutdown_and_wait(self) -> RelayResult<()> {
        self.shutdown();
        self.wait().await
    }
}
