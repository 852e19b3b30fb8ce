mod base;
pub mod factory;
mod polling;

pub use base::*;
pub use factory::{RegisteredTask, create_task};
pub use polling::*;
