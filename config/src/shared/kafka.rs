use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::ValidationError;

/// Settings for the Kafka producer shared by all tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KafkaConfig {
    /// Comma separated `host:port` list of brokers.
    pub bootstrap_servers: String,
    /// Client id reported to the brokers.
    #[serde(default)]
    pub client_id: Option<String>,
    /// How long a publish waits for its delivery report before failing.
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
    /// Extra librdkafka properties. Underscores in keys stand for dots,
    /// `compression_type` sets `compression.type`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_message_timeout_ms() -> u64 {
    KafkaConfig::DEFAULT_MESSAGE_TIMEOUT_MS
}

impl KafkaConfig {
    pub const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 30_000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(ValidationError::empty("kafka.bootstrap_servers"));
        }
        if self.message_timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig(
                "`kafka.message_timeout_ms` must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
