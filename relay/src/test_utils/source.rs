use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::concurrency::stream::StopOnErrorStream;
use crate::error::RelayResult;
use crate::models::Record;
use crate::source::{RowSource, RowStream};

#[derive(Debug)]
struct Inner<R> {
    runs: VecDeque<Vec<RelayResult<R>>>,
    requested: Vec<DateTime<Utc>>,
}

/// [`RowSource`] replaying a prepared batch of results on every call to `stream`.
///
/// Each call consumes the next batch; once they run out the stream is empty.
/// Results after the first error are never yielded.
#[derive(Debug, Clone)]
pub struct ScriptedRowSource<R> {
    inner: Arc<Mutex<Inner<R>>>,
}

impl<R> ScriptedRowSource<R> {
    pub fn new<I>(runs: I) -> Self
    where
        I: IntoIterator<Item = Vec<RelayResult<R>>>,
    {
        let inner = Inner {
            runs: runs.into_iter().collect(),
            requested: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Checkpoints the source was asked to stream from, oldest first.
    pub fn requested(&self) -> Vec<DateTime<Utc>> {
        self.lock().requested.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: Record> RowSource for ScriptedRowSource<R> {
    type Record = R;

    fn stream(&self, since: DateTime<Utc>) -> RowStream<'_, R> {
        let rows = {
            let mut inner = self.lock();
            inner.requested.push(since);
            inner.runs.pop_front().unwrap_or_default()
        };

        StopOnErrorStream::wrap(stream::iter(rows)).boxed()
    }
}
