use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,

    /// A required field is empty.
    #[error("`{field}` cannot be empty")]
    EmptyField { field: String },

    /// A task is scheduled with a zero interval.
    #[error("Task `{0}` must have an `interval_ms` greater than zero")]
    ZeroInterval(String),

    /// No tasks are configured.
    #[error("At least one task must be configured")]
    NoTasks,

    /// Two tasks share the same name and would share a checkpoint.
    #[error("Task name `{0}` is configured more than once")]
    DuplicateTaskName(String),

    /// General configuration validation error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ValidationError {
    pub(crate) fn empty(field: impl Into<String>) -> Self {
        Self::EmptyField {
            field: field.into(),
        }
    }
}
