use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

use crate::error::{RelayError, RelayResult};

/// Phase of a task run, observable while the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    ReadingCheckpoint,
    Streaming,
    Draining,
    Advancing,
    /// The checkpoint could not be read and the run was abandoned.
    Failed,
}

/// Outcome of one task run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Checkpoint read at the start of the run.
    pub since: DateTime<Utc>,
    /// Rows yielded by the row stream.
    pub rows: u64,
    pub published: u64,
    pub encode_failures: u64,
    pub publish_failures: u64,
    /// Error that ended the row stream early, if any.
    pub stream_error: Option<RelayError>,
    /// Checkpoint written at the end of the run, if it was advanced.
    pub checkpoint: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            since,
            rows: 0,
            published: 0,
            encode_failures: 0,
            publish_failures: 0,
            stream_error: None,
            checkpoint: None,
        }
    }

    /// Rows that were read but not published in this run.
    pub fn failed_rows(&self) -> u64 {
        self.encode_failures + self.publish_failures
    }
}

/// Something a runner can execute on an interval.
pub trait Runnable: Send + Sync + 'static {
    /// Unique name, used as checkpoint key and in logs.
    fn name(&self) -> &str;

    /// Time between two runs.
    fn interval(&self) -> Duration;

    /// Performs a single run.
    fn execute(&self) -> impl Future<Output = RelayResult<RunReport>> + Send;
}
