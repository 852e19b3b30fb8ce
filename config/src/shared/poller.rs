use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

use crate::Config;
use crate::shared::{
    KafkaConfig, PgConnectionConfig, SchemaRegistryConfig, TaskConfig, ValidationError,
};

/// Configuration for the poller service.
///
/// Tasks come from the inline `tasks` list and, when `tasks_dir` is set, from
/// every task file in that directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollerConfig {
    /// Database holding the polled tables and the checkpoint table.
    pub source: PgConnectionConfig,
    pub kafka: KafkaConfig,
    pub schema_registry: SchemaRegistryConfig,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub tasks_dir: Option<String>,
    /// Address the Prometheus endpoint listens on. Metrics are not exported when unset.
    #[serde(default)]
    pub metrics_address: Option<SocketAddr>,
}

impl PollerConfig {
    /// Validates the service settings and the given set of tasks.
    ///
    /// `tasks` is the merged list of inline and file based tasks.
    pub fn validate(&self, tasks: &[TaskConfig]) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.kafka.validate()?;
        self.schema_registry.validate()?;
        validate_tasks(tasks)
    }
}

impl Config for PollerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Checks every task and that no two tasks share a name.
pub fn validate_tasks(tasks: &[TaskConfig]) -> Result<(), ValidationError> {
    if tasks.is_empty() {
        return Err(ValidationError::NoTasks);
    }

    let mut names = HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()?;
        if !names.insert(task.name.as_str()) {
            return Err(ValidationError::DuplicateTaskName(task.name.clone()));
        }
    }

    Ok(())
}
