use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::bail;
use crate::error::{ErrorKind, RelayResult};
use crate::publisher::{DeliveryReport, Publisher};

/// Wraps a [`Publisher`] and rejects messages whose key is in the failing set.
///
/// The set can be changed between runs to model a broker that recovers.
#[derive(Debug, Clone)]
pub struct FailingPublisher<P> {
    publisher: P,
    failing_keys: Arc<Mutex<HashSet<Vec<u8>>>>,
}

impl<P> FailingPublisher<P> {
    pub fn wrap<I, K>(publisher: P, failing_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let failing_keys = failing_keys
            .into_iter()
            .map(|key| key.as_ref().to_vec())
            .collect();

        Self {
            publisher,
            failing_keys: Arc::new(Mutex::new(failing_keys)),
        }
    }

    /// Stops injecting failures.
    pub fn heal(&self) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn inner(&self) -> &P {
        &self.publisher
    }

    fn should_fail(&self, key: &[u8]) -> bool {
        self.failing_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }
}

impl<P> Publisher for FailingPublisher<P>
where
    P: Publisher + Sync,
{
    async fn publish(&self, topic: &str, key: &[u8], value: &[u8]) -> RelayResult<DeliveryReport> {
        if self.should_fail(key) {
            bail!(
                ErrorKind::DeliveryFailed,
                "Injected delivery failure",
                String::from_utf8_lossy(key)
            );
        }

        self.publisher.publish(topic, key, value).await
    }

    async fn close(&self) -> RelayResult<()> {
        self.publisher.close().await
    }
}
