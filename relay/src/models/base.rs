use serde::Serialize;
use std::fmt::Debug;

/// A typed row produced by a task's query and published as one message.
///
/// Field names of the serialized form match the fields of [`Record::avro_schema`].
pub trait Record: Serialize + Debug + Send + Sync + Unpin + 'static {
    /// Avro schema of the serialized record, used when schemas are auto registered.
    fn avro_schema() -> &'static str;

    /// Message key, the entity identifier as a string.
    fn key(&self) -> String;
}
