use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::bail;
use crate::error::{ErrorKind, RelayResult};
use crate::store::{CheckpointStore, MemoryCheckpointStore};

#[derive(Debug, Default)]
struct Faults {
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

/// [`MemoryCheckpointStore`] whose reads and writes can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct FaultyCheckpointStore {
    store: MemoryCheckpointStore,
    faults: Arc<Faults>,
}

impl FaultyCheckpointStore {
    pub fn wrap(store: MemoryCheckpointStore) -> Self {
        Self {
            store,
            faults: Arc::default(),
        }
    }

    pub fn fail_get(&self, fail: bool) {
        self.faults.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.faults.fail_set.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls, failed ones included.
    pub fn gets(&self) -> usize {
        self.faults.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls, failed ones included.
    pub fn sets(&self) -> usize {
        self.faults.sets.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryCheckpointStore {
        &self.store
    }
}

impl CheckpointStore for FaultyCheckpointStore {
    async fn get(&self, task: &str) -> RelayResult<DateTime<Utc>> {
        self.faults.gets.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_get.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::CheckpointReadFailed,
                "Failed to get last sync time for task",
                task
            );
        }

        self.store.get(task).await
    }

    async fn set(&self, task: &str, synced_at: DateTime<Utc>) -> RelayResult<()> {
        self.faults.sets.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_set.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::CheckpointWriteFailed,
                "Failed to update sync time",
                task
            );
        }

        self.store.set(task, synced_at).await
    }
}
