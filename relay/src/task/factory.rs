use config::shared::TaskConfig;
use sqlx::PgPool;
use std::time::Duration;

use crate::encoding::Encoder;
use crate::error::{ErrorKind, RelayResult};
use crate::models::User;
use crate::publisher::Publisher;
use crate::relay_error;
use crate::source::PgRowSource;
use crate::store::CheckpointStore;
use crate::task::{RunReport, Runnable, Task};

/// Record name selecting [`User`] rows.
pub const USER_RECORD: &str = "user";

/// Record types a task can be configured with.
pub const REGISTERED_RECORDS: &[&str] = &[USER_RECORD];

/// A task over one of the registered record types.
#[derive(Debug)]
pub enum RegisteredTask<C, E, P> {
    User(Task<PgRowSource<User>, C, E, P>),
}

/// Builds the task described by `config`.
///
/// The record type comes from `config.record`, or from the task name when unset.
/// Fails if the record type is unknown or the query file cannot be read.
pub fn create_task<C, E, P>(
    config: TaskConfig,
    pool: PgPool,
    store: C,
    encoder: E,
    publisher: P,
) -> RelayResult<RegisteredTask<C, E, P>>
where
    C: CheckpointStore,
    E: Encoder,
    P: Publisher,
{
    let record = config.record_name().to_owned();
    match record.as_str() {
        USER_RECORD => {
            let source = PgRowSource::<User>::from_file(pool, &config.query_file)?;
            Ok(RegisteredTask::User(Task::new(
                config, source, store, encoder, publisher,
            )))
        }
        other => Err(relay_error!(
            ErrorKind::UnsupportedTask,
            "Unsupported record type",
            format!(
                "task `{}` uses `{other}`, expected one of {REGISTERED_RECORDS:?}",
                config.name
            )
        )),
    }
}

impl<C, E, P> Runnable for RegisteredTask<C, E, P>
where
    C: CheckpointStore + Send + Sync + 'static,
    E: Encoder + Send + Sync + 'static,
    P: Publisher + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        match self {
            RegisteredTask::User(task) => task.name(),
        }
    }

    fn interval(&self) -> Duration {
        match self {
            RegisteredTask::User(task) => task.interval(),
        }
    }

    async fn execute(&self) -> RelayResult<RunReport> {
        match self {
            RegisteredTask::User(task) => task.run().await,
        }
    }
}
