use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// When a task run moves its checkpoint forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPolicy {
    /// Advance after every run whose checkpoint could be read, even if rows or
    /// the stream itself failed.
    #[default]
    Always,
    /// Keep the previous checkpoint when the row stream ended with an error.
    /// Row level encode or publish failures still advance.
    SkipOnStreamError,
}

/// Definition of one polling task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskConfig {
    /// Unique task name, also the checkpoint key.
    pub name: String,
    /// Path of the SQL file selecting the rows changed since `$1`.
    pub query_file: String,
    /// Topic every row is published to.
    pub topic: String,
    /// Schema registry subject used to encode rows.
    pub schema: String,
    /// Time between two runs.
    pub interval_ms: u64,
    /// Registered record type produced by the query. Defaults to `name`.
    #[serde(default)]
    pub record: Option<String>,
    #[serde(default)]
    pub checkpoint_policy: CheckpointPolicy,
}

impl TaskConfig {
    /// Name of the record type the task produces.
    pub fn record_name(&self) -> &str {
        self.record.as_deref().unwrap_or(&self.name)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("name", &self.name),
            ("query_file", &self.query_file),
            ("topic", &self.topic),
            ("schema", &self.schema),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::empty(format!("tasks.{field}")));
            }
        }

        if self.interval_ms == 0 {
            return Err(ValidationError::ZeroInterval(self.name.clone()));
        }

        Ok(())
    }
}
