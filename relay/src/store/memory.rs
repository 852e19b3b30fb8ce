use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::RelayResult;
use crate::store::{CheckpointStore, ZERO_CHECKPOINT};

#[derive(Debug, Default)]
struct Inner {
    checkpoints: HashMap<String, DateTime<Utc>>,
    history: HashMap<String, Vec<DateTime<Utc>>>,
}

/// In-process [`CheckpointStore`] that also remembers every write per task.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `checkpoints`.
    pub fn with_checkpoints<I, K>(checkpoints: I) -> Self
    where
        I: IntoIterator<Item = (K, DateTime<Utc>)>,
        K: Into<String>,
    {
        let inner = Inner {
            checkpoints: checkpoints
                .into_iter()
                .map(|(task, synced_at)| (task.into(), synced_at))
                .collect(),
            history: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Every value written for `task`, oldest first.
    pub async fn history(&self, task: &str) -> Vec<DateTime<Utc>> {
        let inner = self.inner.lock().await;
        inner.history.get(task).cloned().unwrap_or_default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, task: &str) -> RelayResult<DateTime<Utc>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .checkpoints
            .get(task)
            .copied()
            .unwrap_or(ZERO_CHECKPOINT))
    }

    async fn set(&self, task: &str, synced_at: DateTime<Utc>) -> RelayResult<()> {
        let mut inner = self.inner.lock().await;

        inner.checkpoints.insert(task.to_owned(), synced_at);
        inner
            .history
            .entry(task.to_owned())
            .or_default()
            .push(synced_at);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn absent_checkpoint_is_the_zero_timestamp() {
        let store = MemoryCheckpointStore::new();

        assert_eq!(store.get("user").await.unwrap(), ZERO_CHECKPOINT);
    }

    #[test]
    fn zero_checkpoint_precedes_the_unix_epoch() {
        assert_eq!(
            ZERO_CHECKPOINT,
            Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(ZERO_CHECKPOINT < Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn set_is_an_upsert_keyed_by_task() {
        let store = MemoryCheckpointStore::new();
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();

        store.set("user", first).await.unwrap();
        store.set("user", second).await.unwrap();
        store.set("order", first).await.unwrap();

        assert_eq!(store.get("user").await.unwrap(), second);
        assert_eq!(store.get("order").await.unwrap(), first);
        assert_eq!(store.history("user").await, vec![first, second]);
    }
}
