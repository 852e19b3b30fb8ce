//! Logging and metrics setup for the poller.

mod logging;
mod metrics;

pub use self::logging::*;
pub use self::metrics::*;
