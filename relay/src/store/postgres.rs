use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{ErrorKind, RelayResult};
use crate::relay_error;
use crate::store::{CheckpointStore, ZERO_CHECKPOINT};

/// [`CheckpointStore`] backed by the `relay.sync` table.
///
/// Shares the pool of the row sources; checkpoints live in the same database
/// as the polled tables.
#[derive(Debug, Clone)]
pub struct PostgresCheckpointStore {
    pool: PgPool,
}

impl PostgresCheckpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckpointStore for PostgresCheckpointStore {
    async fn get(&self, task: &str) -> RelayResult<DateTime<Utc>> {
        let synced_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r#"
            select synced_at
            from relay.sync
            where task = $1
            "#,
        )
        .bind(task)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            relay_error!(
                ErrorKind::CheckpointReadFailed,
                "Failed to get last sync time for task",
                format!("{task}: {err}")
            )
        })?;

        Ok(synced_at.flatten().unwrap_or(ZERO_CHECKPOINT))
    }

    async fn set(&self, task: &str, synced_at: DateTime<Utc>) -> RelayResult<()> {
        sqlx::query(
            r#"
            insert into relay.sync (task, synced_at)
            values ($1, $2)
            on conflict (task)
            do update set synced_at = excluded.synced_at
            "#,
        )
        .bind(task)
        .bind(synced_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            relay_error!(
                ErrorKind::CheckpointWriteFailed,
                "Failed to update sync time",
                format!("{task}: {err}")
            )
        })?;

        debug!(task, %synced_at, "checkpoint stored");

        Ok(())
    }
}
