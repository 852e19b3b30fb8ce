use std::future::Future;

use crate::error::RelayResult;

/// Where a published message landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Hands key/value pairs to a message broker.
pub trait Publisher {
    /// Publishes one message and resolves once the broker reported its delivery outcome.
    fn publish(
        &self,
        topic: &str,
        key: &[u8],
        value: &[u8],
    ) -> impl Future<Output = RelayResult<DeliveryReport>> + Send;

    /// Flushes outstanding messages and releases broker resources.
    ///
    /// Must not be called while a publish is in flight.
    fn close(&self) -> impl Future<Output = RelayResult<()>> + Send;
}
