mod base;
mod connection;
mod kafka;
mod poller;
mod schema_registry;
mod task;

pub use base::*;
pub use connection::*;
pub use kafka::*;
pub use poller::*;
pub use schema_registry::*;
pub use task::*;
