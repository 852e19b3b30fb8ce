use apache_avro::{from_avro_datum, from_value, to_avro_datum, to_value};
use serde::de::DeserializeOwned;

use crate::encoding::{Encoder, RegisteredSchema, SchemaRegistry, wire};
use crate::error::{ErrorKind, RelayResult};
use crate::models::Record;
use crate::relay_error;

/// How the encoder picks the writer schema for a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaStrategy {
    /// Use the latest version already registered under the subject.
    #[default]
    Latest,
    /// Register the record's own schema under the subject and use it.
    AutoRegister,
}

/// [`Encoder`] producing Avro datums in the Confluent wire format.
#[derive(Debug, Clone)]
pub struct AvroEncoder<G> {
    registry: G,
    strategy: SchemaStrategy,
}

impl<G> AvroEncoder<G>
where
    G: SchemaRegistry,
{
    pub fn new(registry: G, strategy: SchemaStrategy) -> Self {
        Self { registry, strategy }
    }

    async fn writer_schema<R: Record>(&self, subject: &str) -> RelayResult<RegisteredSchema> {
        match self.strategy {
            SchemaStrategy::Latest => self.registry.latest(subject).await,
            SchemaStrategy::AutoRegister => {
                self.registry.register(subject, R::avro_schema()).await
            }
        }
    }
}

impl<G> Encoder for AvroEncoder<G>
where
    G: SchemaRegistry,
{
    async fn serialize<R: Record>(&self, subject: &str, record: &R) -> RelayResult<Vec<u8>> {
        let registered = self.writer_schema::<R>(subject).await?;

        let value = to_value(record)?.resolve(&registered.schema)?;
        let datum = to_avro_datum(&registered.schema, value)?;

        Ok(wire::encode(registered.id, &datum))
    }
}

/// Reads payloads written by [`AvroEncoder`] back into typed records.
#[derive(Debug, Clone)]
pub struct AvroDecoder<G> {
    registry: G,
}

impl<G> AvroDecoder<G>
where
    G: SchemaRegistry,
{
    pub fn new(registry: G) -> Self {
        Self { registry }
    }

    pub async fn deserialize<T: DeserializeOwned>(&self, payload: &[u8]) -> RelayResult<T> {
        let (schema_id, mut datum) = wire::decode(payload)?;
        let registered = self.registry.by_id(schema_id).await?;

        let value = from_avro_datum(&registered.schema, &mut datum, None).map_err(|err| {
            relay_error!(
                ErrorKind::DeserializationError,
                "Failed to read Avro datum",
                err
            )
        })?;

        from_value::<T>(&value).map_err(|err| {
            relay_error!(
                ErrorKind::DeserializationError,
                "Avro datum does not match the record",
                err
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::MemorySchemaRegistry;
    use crate::models::{Country, User};
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    fn user(email: Option<&str>) -> User {
        User {
            id: 7,
            status: "active".to_string(),
            name: "Grace".to_string(),
            email: email.map(str::to_string),
            country: Country {
                code: "US".to_string(),
                name: "United States".to_string(),
            },
            created_at: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        }
    }

    #[tokio::test]
    async fn round_trip_keeps_microsecond_timestamps() {
        let registry = MemorySchemaRegistry::new();
        let encoder = AvroEncoder::new(registry.clone(), SchemaStrategy::AutoRegister);
        let decoder = AvroDecoder::new(registry);
        let mut original = user(None);
        original.created_at = Utc.timestamp_micros(1_600_000_000_000_001).unwrap();
        original.updated_at = Utc.timestamp_micros(1_700_000_000_123_456).unwrap();

        let payload = encoder.serialize("users-value", &original).await.unwrap();
        let decoded: User = decoder.deserialize(&payload).await.unwrap();

        assert_eq!(decoded.updated_at, original.updated_at);
        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn round_trip_preserves_nested_and_nullable_fields() {
        let registry = MemorySchemaRegistry::new();
        let encoder = AvroEncoder::new(registry.clone(), SchemaStrategy::AutoRegister);
        let decoder = AvroDecoder::new(registry);

        for original in [user(Some("grace@example.com")), user(None)] {
            let payload = encoder.serialize("users-value", &original).await.unwrap();
            let decoded: User = decoder.deserialize(&payload).await.unwrap();

            assert_eq!(decoded, original);
        }
    }

    #[tokio::test]
    async fn payload_is_prefixed_with_the_registered_id() {
        let registry = MemorySchemaRegistry::new();
        registry
            .register("other-value", r#"{"type": "string"}"#)
            .await
            .unwrap();
        registry
            .register("users-value", User::avro_schema())
            .await
            .unwrap();
        let encoder = AvroEncoder::new(registry, SchemaStrategy::Latest);

        let payload = encoder.serialize("users-value", &user(None)).await.unwrap();

        assert_eq!(&payload[..5], &[0, 0, 0, 0, 2]);
    }

    #[tokio::test]
    async fn encoding_is_deterministic() {
        let registry = MemorySchemaRegistry::new();
        let encoder = AvroEncoder::new(registry, SchemaStrategy::AutoRegister);
        let record = user(Some("grace@example.com"));

        let first = encoder.serialize("users-value", &record).await.unwrap();
        let second = encoder.serialize("users-value", &record).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unregistered_subject_fails_with_latest_strategy() {
        let encoder = AvroEncoder::new(MemorySchemaRegistry::new(), SchemaStrategy::Latest);

        let err = encoder
            .serialize("users-value", &user(None))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaNotFound);
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Mismatched {
        unexpected: bool,
    }

    impl Record for Mismatched {
        fn avro_schema() -> &'static str {
            r#"{"type": "record", "name": "Mismatched", "fields": [{"name": "unexpected", "type": "boolean"}]}"#
        }

        fn key(&self) -> String {
            "mismatched".to_string()
        }
    }

    #[tokio::test]
    async fn record_not_matching_the_subject_schema_is_a_serialization_error() {
        let registry = MemorySchemaRegistry::new();
        registry
            .register("users-value", User::avro_schema())
            .await
            .unwrap();
        let encoder = AvroEncoder::new(registry, SchemaStrategy::Latest);

        let err = encoder
            .serialize("users-value", &Mismatched { unexpected: true })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SerializationError);
    }
}
