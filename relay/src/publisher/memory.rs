use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, RelayResult};
use crate::publisher::{DeliveryReport, Publisher};

/// A message accepted by [`MemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub offset: i64,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<PublishedMessage>,
    offsets: HashMap<String, i64>,
    closed: bool,
}

/// In-process [`Publisher`] keeping every message, with one partition per topic.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published messages in publish order.
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.inner.lock().await.messages.clone()
    }

    /// Messages published to `topic` in publish order.
    pub async fn messages_for(&self, topic: &str) -> Vec<PublishedMessage> {
        let inner = self.inner.lock().await;
        inner
            .messages
            .iter()
            .filter(|message| message.topic == topic)
            .cloned()
            .collect()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, key: &[u8], value: &[u8]) -> RelayResult<DeliveryReport> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            bail!(ErrorKind::PublisherClosed, "Publisher is closed", topic);
        }

        let next_offset = inner.offsets.entry(topic.to_owned()).or_insert(0);
        let offset = *next_offset;
        *next_offset += 1;

        inner.messages.push(PublishedMessage {
            topic: topic.to_owned(),
            key: key.to_vec(),
            value: value.to_vec(),
            offset,
        });

        Ok(DeliveryReport {
            topic: topic.to_owned(),
            partition: 0,
            offset,
        })
    }

    async fn close(&self) -> RelayResult<()> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;

        info!(messages = inner.messages.len(), "memory publisher closed");

        Ok(())
    }
}
