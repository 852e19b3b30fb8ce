use apache_avro::Schema;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::encoding::registry::parse_schema;
use crate::encoding::{RegisteredSchema, SchemaRegistry};
use crate::error::{ErrorKind, RelayResult};
use crate::relay_error;

#[derive(Debug, Default)]
struct Inner {
    schemas: Vec<Arc<Schema>>,
    subjects: HashMap<String, Vec<u32>>,
}

impl Inner {
    fn get(&self, id: u32) -> Option<RegisteredSchema> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.schemas.get(index).map(|schema| RegisteredSchema {
            id,
            schema: schema.clone(),
        })
    }
}

/// In-process [`SchemaRegistry`] assigning ids sequentially from 1.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaRegistry for MemorySchemaRegistry {
    async fn latest(&self, subject: &str) -> RelayResult<RegisteredSchema> {
        let inner = self.inner.lock().await;

        inner
            .subjects
            .get(subject)
            .and_then(|versions| versions.last())
            .and_then(|id| inner.get(*id))
            .ok_or_else(|| {
                relay_error!(
                    ErrorKind::SchemaNotFound,
                    "Schema not found in registry",
                    subject
                )
            })
    }

    async fn register(&self, subject: &str, schema: &str) -> RelayResult<RegisteredSchema> {
        let parsed = parse_schema(schema)?;
        let canonical = parsed.canonical_form();
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner
            .subjects
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.get(*id))
            .find(|registered| registered.schema.canonical_form() == canonical)
        {
            return Ok(existing);
        }

        inner.schemas.push(Arc::new(parsed));
        let id = u32::try_from(inner.schemas.len()).map_err(|err| {
            relay_error!(
                ErrorKind::SchemaRegistryFailed,
                "Schema id space exhausted",
                err
            )
        })?;
        inner
            .subjects
            .entry(subject.to_owned())
            .or_default()
            .push(id);

        inner.get(id).ok_or_else(|| {
            relay_error!(
                ErrorKind::InvalidState,
                "Registered schema vanished",
                id
            )
        })
    }

    async fn by_id(&self, id: u32) -> RelayResult<RegisteredSchema> {
        let inner = self.inner.lock().await;

        inner.get(id).ok_or_else(|| {
            relay_error!(ErrorKind::SchemaNotFound, "Unknown schema id", id)
        })
    }
}
