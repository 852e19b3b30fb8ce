use chrono::Utc;
use config::shared::{CheckpointPolicy, TaskConfig};
use futures::StreamExt;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::encoding::Encoder;
use crate::error::RelayResult;
use crate::metrics::{
    ENCODE, PUBLISH, RELAY_CHECKPOINT_ADVANCES_TOTAL, RELAY_ROW_FAILURES_TOTAL,
    RELAY_ROWS_PUBLISHED_TOTAL, RELAY_STREAM_ERRORS_TOTAL, RELAY_TASK_RUN_DURATION_SECONDS,
    STAGE, TASK,
};
use crate::models::Record;
use crate::publisher::Publisher;
use crate::source::RowSource;
use crate::store::CheckpointStore;
use crate::task::{RunReport, Runnable, TaskState};

/// Polls one entity: streams rows changed since its checkpoint, publishes
/// each of them and moves the checkpoint forward.
///
/// A run never retries a row. Rows that fail to encode or publish are logged
/// and skipped, and are read again by a later run as long as the checkpoint
/// has not moved past them.
#[derive(Debug)]
pub struct Task<S, C, E, P> {
    config: Arc<TaskConfig>,
    source: S,
    store: C,
    encoder: E,
    publisher: P,
    state_tx: watch::Sender<TaskState>,
}

impl<S, C, E, P> Task<S, C, E, P>
where
    S: RowSource,
    C: CheckpointStore,
    E: Encoder,
    P: Publisher,
{
    pub fn new(config: TaskConfig, source: S, store: C, encoder: E, publisher: P) -> Self {
        let (state_tx, _) = watch::channel(TaskState::Idle);

        Self {
            config: Arc::new(config),
            source,
            store,
            encoder,
            publisher,
            state_tx,
        }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Subscribes to the state transitions of this task.
    pub fn state(&self) -> watch::Receiver<TaskState> {
        self.state_tx.subscribe()
    }

    pub fn current_state(&self) -> TaskState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: TaskState) {
        self.state_tx.send_replace(state);
    }

    /// Runs the task once.
    ///
    /// Fails without side effects when the checkpoint cannot be read, and
    /// fails after streaming when the new checkpoint cannot be written. Row
    /// and stream failures are reported in the returned [`RunReport`].
    pub async fn run(&self) -> RelayResult<RunReport> {
        let name = self.config.name.as_str();
        let started_at = Instant::now();

        self.set_state(TaskState::ReadingCheckpoint);
        let since = match self.store.get(name).await {
            Ok(since) => since,
            Err(err) => {
                self.set_state(TaskState::Failed);
                error!(task = name, error = %err, "failed to read checkpoint, skipping run");
                return Err(err);
            }
        };

        // Captured before the query runs so rows written during this run are read again next time.
        let now = Utc::now();
        let mut report = RunReport::new(since);

        self.set_state(TaskState::Streaming);
        debug!(task = name, %since, "streaming changed rows");
        let mut rows = self.source.stream(since);
        while let Some(row) = rows.next().await {
            match row {
                Ok(record) => {
                    report.rows += 1;
                    self.relay(&record, &mut report).await;
                }
                Err(err) => report.stream_error = Some(err),
            }
        }
        drop(rows);

        self.set_state(TaskState::Draining);
        if let Some(err) = &report.stream_error {
            counter!(RELAY_STREAM_ERRORS_TOTAL, TASK => self.config.name.clone()).increment(1);
            error!(task = name, rows = report.rows, error = %err, "row stream ended with an error");
        }

        self.set_state(TaskState::Advancing);
        if self.should_advance(&report) {
            let checkpoint = now.max(since);
            if let Err(err) = self.store.set(name, checkpoint).await {
                self.set_state(TaskState::Idle);
                error!(task = name, error = %err, "failed to store checkpoint");
                return Err(err);
            }

            counter!(RELAY_CHECKPOINT_ADVANCES_TOTAL, TASK => self.config.name.clone())
                .increment(1);
            report.checkpoint = Some(checkpoint);
        } else {
            warn!(task = name, %since, "row stream failed, keeping previous checkpoint");
        }

        self.set_state(TaskState::Idle);

        let elapsed = started_at.elapsed();
        histogram!(RELAY_TASK_RUN_DURATION_SECONDS, TASK => self.config.name.clone())
            .record(elapsed.as_secs_f64());

        info!(
            task = name,
            rows = report.rows,
            published = report.published,
            encode_failures = report.encode_failures,
            publish_failures = report.publish_failures,
            stream_failed = report.stream_error.is_some(),
            checkpoint = ?report.checkpoint,
            elapsed_ms = elapsed.as_millis() as u64,
            "task run completed"
        );

        Ok(report)
    }

    fn should_advance(&self, report: &RunReport) -> bool {
        match self.config.checkpoint_policy {
            CheckpointPolicy::Always => true,
            CheckpointPolicy::SkipOnStreamError => report.stream_error.is_none(),
        }
    }

    async fn relay(&self, record: &S::Record, report: &mut RunReport) {
        let name = self.config.name.as_str();
        let key = record.key();

        let payload = match self.encoder.serialize(&self.config.schema, record).await {
            Ok(payload) => payload,
            Err(err) => {
                report.encode_failures += 1;
                counter!(RELAY_ROW_FAILURES_TOTAL, TASK => self.config.name.clone(), STAGE => ENCODE)
                    .increment(1);
                warn!(task = name, key = %key, error = %err, "failed to encode record, skipping");
                return;
            }
        };

        match self
            .publisher
            .publish(&self.config.topic, key.as_bytes(), &payload)
            .await
        {
            Ok(delivery) => {
                report.published += 1;
                counter!(RELAY_ROWS_PUBLISHED_TOTAL, TASK => self.config.name.clone()).increment(1);
                debug!(
                    task = name,
                    key = %key,
                    topic = %delivery.topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "record published"
                );
            }
            Err(err) => {
                report.publish_failures += 1;
                counter!(RELAY_ROW_FAILURES_TOTAL, TASK => self.config.name.clone(), STAGE => PUBLISH)
                    .increment(1);
                warn!(task = name, key = %key, error = %err, "failed to publish record, skipping");
            }
        }
    }
}

impl<S, C, E, P> Runnable for Task<S, C, E, P>
where
    S: RowSource + 'static,
    C: CheckpointStore + Send + Sync + 'static,
    E: Encoder + Send + Sync + 'static,
    P: Publisher + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    fn interval(&self) -> Duration {
        self.config.interval()
    }

    fn execute(&self) -> impl std::future::Future<Output = RelayResult<RunReport>> + Send {
        self.run()
    }
}
