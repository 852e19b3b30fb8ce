use config::shared::KafkaConfig;
use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ErrorKind, RelayResult};
use crate::publisher::{DeliveryReport, Publisher};
use crate::relay_error;

/// [`Publisher`] backed by a librdkafka producer.
///
/// Clones share the same producer, so one instance serves every task.
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    message_timeout: Duration,
}

impl std::fmt::Debug for KafkaPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaPublisher")
            .field("message_timeout", &self.message_timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaPublisher {
    pub fn new(config: &KafkaConfig) -> RelayResult<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", config.message_timeout_ms.to_string());
        if let Some(client_id) = &config.client_id {
            client_config.set("client.id", client_id);
        }
        for (key, value) in &config.properties {
            client_config.set(property_name(key), value);
        }

        let producer: FutureProducer = client_config.create().map_err(|err| {
            relay_error!(
                ErrorKind::PublishFailed,
                "Failed to create Kafka producer",
                err
            )
        })?;

        info!(bootstrap_servers = %config.bootstrap_servers, "kafka producer created");

        Ok(Self {
            producer,
            message_timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }
}

/// Maps a configuration key to a librdkafka property, `compression_type` to
/// `compression.type`. Nested configuration keys cannot contain dots.
fn property_name(key: &str) -> String {
    key.replace('_', ".")
}

impl Publisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &[u8], value: &[u8]) -> RelayResult<DeliveryReport> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        match self
            .producer
            .send(record, Timeout::After(self.message_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(topic, partition, offset, "message delivered");
                Ok(DeliveryReport {
                    topic: topic.to_owned(),
                    partition,
                    offset,
                })
            }
            Err((KafkaError::MessageProduction(code), _)) => Err(relay_error!(
                ErrorKind::DeliveryFailed,
                "Broker rejected message",
                format!("{topic}: {code}")
            )),
            Err((err, _)) => Err(relay_error!(
                ErrorKind::PublishFailed,
                "Failed to publish message",
                format!("{topic}: {err}")
            )),
        }
    }

    async fn close(&self) -> RelayResult<()> {
        let producer = self.producer.clone();
        let timeout = self.message_timeout;

        // `flush` blocks the calling thread until the queue drains or the timeout expires.
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|err| {
                relay_error!(
                    ErrorKind::PublishFailed,
                    "Kafka flush task failed",
                    err
                )
            })??;

        info!("kafka producer flushed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn underscores_map_to_property_dots() {
        assert_eq!(property_name("compression_type"), "compression.type");
        assert_eq!(property_name("acks"), "acks");
    }

    #[tokio::test]
    async fn producer_is_created_without_contacting_brokers() {
        let config = KafkaConfig {
            bootstrap_servers: "localhost:1".to_string(),
            client_id: Some("relay-test".to_string()),
            message_timeout_ms: 100,
            properties: BTreeMap::from([("compression_type".to_string(), "lz4".to_string())]),
        };

        let publisher = KafkaPublisher::new(&config).unwrap();

        assert_eq!(publisher.message_timeout, Duration::from_millis(100));
    }
}
