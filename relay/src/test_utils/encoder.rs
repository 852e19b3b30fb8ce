use std::collections::HashSet;
use std::sync::Arc;

use crate::bail;
use crate::encoding::Encoder;
use crate::error::{ErrorKind, RelayResult};
use crate::models::Record;

/// Wraps an [`Encoder`] and fails for records whose key is in the given set.
#[derive(Debug, Clone)]
pub struct FailingEncoder<E> {
    encoder: E,
    failing_keys: Arc<HashSet<String>>,
}

impl<E> FailingEncoder<E> {
    pub fn wrap<I, K>(encoder: E, failing_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            encoder,
            failing_keys: Arc::new(failing_keys.into_iter().map(Into::into).collect()),
        }
    }
}

impl<E> Encoder for FailingEncoder<E>
where
    E: Encoder + Sync,
{
    async fn serialize<R: Record>(&self, subject: &str, record: &R) -> RelayResult<Vec<u8>> {
        let key = record.key();
        if self.failing_keys.contains(&key) {
            bail!(
                ErrorKind::SerializationError,
                "Injected encoding failure",
                key
            );
        }

        self.encoder.serialize(subject, record).await
    }
}
