//! Configuration management for the poller.
//!
//! Provides environment detection, layered configuration loading from YAML
//! files and environment variables, per-task configuration files, secret
//! handling and the shared typed settings consumed by the relay core.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
