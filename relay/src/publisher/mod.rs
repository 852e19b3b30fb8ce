mod base;
#[cfg(feature = "kafka")]
mod kafka;
mod memory;

pub use base::*;
#[cfg(feature = "kafka")]
pub use kafka::*;
pub use memory::*;
