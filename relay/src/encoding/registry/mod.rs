mod http;
mod memory;

pub use http::HttpSchemaRegistry;
pub(crate) use http::parse_schema;
pub use memory::MemorySchemaRegistry;
