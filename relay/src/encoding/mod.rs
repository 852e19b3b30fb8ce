mod avro;
mod base;
pub mod registry;
pub mod wire;

pub use avro::*;
pub use base::*;
pub use registry::{HttpSchemaRegistry, MemorySchemaRegistry};
