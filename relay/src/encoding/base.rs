use apache_avro::Schema;
use std::future::Future;
use std::sync::Arc;

use crate::error::RelayResult;
use crate::models::Record;

/// Turns records into the payload bytes published for them.
///
/// Encoding is deterministic for a given schema and record; registering or
/// fetching schemas happens behind this interface.
pub trait Encoder {
    /// Encodes `record` with the schema registered under `subject`.
    fn serialize<R: Record>(
        &self,
        subject: &str,
        record: &R,
    ) -> impl Future<Output = RelayResult<Vec<u8>>> + Send;
}

/// A parsed schema together with the id the registry assigned to it.
#[derive(Debug, Clone)]
pub struct RegisteredSchema {
    pub id: u32,
    pub schema: Arc<Schema>,
}

/// Client of a schema registry.
pub trait SchemaRegistry: Send + Sync {
    /// Latest schema version registered under `subject`.
    fn latest(&self, subject: &str) -> impl Future<Output = RelayResult<RegisteredSchema>> + Send;

    /// Registers `schema` under `subject`, returning the existing id when already present.
    fn register(
        &self,
        subject: &str,
        schema: &str,
    ) -> impl Future<Output = RelayResult<RegisteredSchema>> + Send;

    /// Schema with the given global id.
    fn by_id(&self, id: u32) -> impl Future<Output = RelayResult<RegisteredSchema>> + Send;
}
