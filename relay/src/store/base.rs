use chrono::{DateTime, Utc};
use std::future::Future;

use crate::error::RelayResult;

/// Checkpoint returned for tasks that never completed a run, `0001-01-01T00:00:00Z`.
///
/// Earlier than any row a query can filter on, rows dated before 1970 included.
pub const ZERO_CHECKPOINT: DateTime<Utc> = match DateTime::from_timestamp(-62_135_596_800, 0) {
    Some(checkpoint) => checkpoint,
    None => panic!("zero checkpoint is out of range"),
};

/// Persists the "last synced" timestamp of each task.
///
/// Every task owns its own key, so writes for different tasks never conflict.
/// Writes for the same task are not synchronized here; one runner owns one task.
pub trait CheckpointStore {
    /// Returns the checkpoint of `task`, or [`ZERO_CHECKPOINT`] when none was stored.
    fn get(&self, task: &str) -> impl Future<Output = RelayResult<DateTime<Utc>>> + Send;

    /// Inserts or replaces the checkpoint of `task`.
    fn set(
        &self,
        task: &str,
        synced_at: DateTime<Utc>,
    ) -> impl Future<Output = RelayResult<()>> + Send;
}
