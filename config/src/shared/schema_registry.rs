use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Connection settings for a Confluent compatible schema registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchemaRegistryConfig {
    /// Base URL, e.g. `http://localhost:8081`.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SerializableSecretString>,
    /// Request timeout for registry lookups.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Register each record's own schema under its subject instead of using
    /// the latest registered version.
    #[serde(default)]
    pub auto_register: bool,
}

fn default_timeout_ms() -> u64 {
    SchemaRegistryConfig::DEFAULT_TIMEOUT_MS
}

impl SchemaRegistryConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::empty("schema_registry.url"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidConfig(
                "`schema_registry.url` must start with http:// or https://".to_string(),
            ));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::InvalidConfig(
                "`schema_registry.password` requires `schema_registry.username`".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_must_be_http() {
        let config = SchemaRegistryConfig {
            url: "localhost:8081".to_string(),
            username: None,
            password: None,
            timeout_ms: 1000,
            auto_register: false,
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConfig(_))
        ));
    }
}
