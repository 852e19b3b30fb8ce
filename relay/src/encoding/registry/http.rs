use apache_avro::Schema;
use config::shared::SchemaRegistryConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::encoding::{RegisteredSchema, SchemaRegistry};
use crate::error::{ErrorKind, RelayResult};
use crate::relay_error;

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

#[derive(Debug, Deserialize)]
struct SubjectVersionResponse {
    id: u32,
    schema: String,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    schema: String,
}

#[derive(Debug, Serialize)]
struct RegisterSchemaRequest<'a> {
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterSchemaResponse {
    id: u32,
}

#[derive(Debug, Default)]
struct Cache {
    by_id: HashMap<u32, Arc<Schema>>,
    latest: HashMap<String, RegisteredSchema>,
    registered: HashMap<(String, String), RegisteredSchema>,
}

/// Client for the REST API of a Confluent compatible schema registry.
///
/// Resolved schemas are cached for the lifetime of the client, so a subject's
/// latest version is fetched once per process.
#[derive(Debug, Clone)]
pub struct HttpSchemaRegistry {
    client: Client,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
    cache: Arc<RwLock<Cache>>,
}

impl HttpSchemaRegistry {
    pub fn new(config: &SchemaRegistryConfig) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let credentials = config.username.clone().map(|username| {
            let password = config
                .password
                .as_ref()
                .map(|password| password.expose_secret().to_owned());
            (username, password)
        });

        let base_url = Url::parse(&config.url).map_err(|err| {
            relay_error!(
                ErrorKind::ConfigError,
                "Invalid schema registry URL",
                format!("{}: {err}", config.url)
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(relay_error!(
                ErrorKind::ConfigError,
                "Schema registry URL cannot be a base",
                config.url
            ));
        }

        Ok(Self {
            client,
            base_url,
            credentials,
            cache: Arc::new(RwLock::new(Cache::default())),
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each of them.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, password.as_ref()),
            None => request,
        }
    }

    async fn check(response: Response, what: &str) -> RelayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(relay_error!(
                ErrorKind::SchemaNotFound,
                "Schema not found in registry",
                format!("{what}: {body}")
            ));
        }

        Err(relay_error!(
            ErrorKind::SchemaRegistryFailed,
            "Schema registry returned an error",
            format!("{what}: {status} {body}")
        ))
    }

    async fn cache_schema(&self, id: u32, raw: &str) -> RelayResult<Arc<Schema>> {
        let schema = Arc::new(parse_schema(raw)?);
        self.cache.write().await.by_id.insert(id, schema.clone());
        Ok(schema)
    }
}

impl SchemaRegistry for HttpSchemaRegistry {
    async fn latest(&self, subject: &str) -> RelayResult<RegisteredSchema> {
        if let Some(registered) = self.cache.read().await.latest.get(subject) {
            return Ok(registered.clone());
        }

        let url = self.endpoint(&["subjects", subject, "versions", "latest"]);
        let request = self.authorize(self.client.get(url).header("Accept", CONTENT_TYPE));
        let response = Self::check(request.send().await?, subject).await?;
        let body: SubjectVersionResponse = response.json().await?;

        let registered = RegisteredSchema {
            id: body.id,
            schema: self.cache_schema(body.id, &body.schema).await?,
        };
        self.cache
            .write()
            .await
            .latest
            .insert(subject.to_owned(), registered.clone());

        debug!(subject, schema_id = registered.id, "resolved latest schema");

        Ok(registered)
    }

    async fn register(&self, subject: &str, schema: &str) -> RelayResult<RegisteredSchema> {
        let key = (subject.to_owned(), schema.to_owned());
        if let Some(registered) = self.cache.read().await.registered.get(&key) {
            return Ok(registered.clone());
        }

        let url = self.endpoint(&["subjects", subject, "versions"]);
        let request = self.authorize(
            self.client
                .post(url)
                .header("Content-Type", CONTENT_TYPE)
                .json(&RegisterSchemaRequest { schema }),
        );
        let response = Self::check(request.send().await?, subject).await?;
        let body: RegisterSchemaResponse = response.json().await?;

        let registered = RegisteredSchema {
            id: body.id,
            schema: self.cache_schema(body.id, schema).await?,
        };
        self.cache
            .write()
            .await
            .registered
            .insert(key, registered.clone());

        info!(subject, schema_id = registered.id, "registered schema");

        Ok(registered)
    }

    async fn by_id(&self, id: u32) -> RelayResult<RegisteredSchema> {
        if let Some(schema) = self.cache.read().await.by_id.get(&id) {
            return Ok(RegisteredSchema {
                id,
                schema: schema.clone(),
            });
        }

        let id_segment = id.to_string();
        let url = self.endpoint(&["schemas", "ids", &id_segment]);
        let request = self.authorize(self.client.get(url).header("Accept", CONTENT_TYPE));
        let response = Self::check(request.send().await?, &format!("id {id}")).await?;
        let body: SchemaResponse = response.json().await?;

        Ok(RegisteredSchema {
            id,
            schema: self.cache_schema(id, &body.schema).await?,
        })
    }
}

pub(crate) fn parse_schema(raw: &str) -> RelayResult<Schema> {
    Schema::parse_str(raw)
        .map_err(|err| relay_error!(ErrorKind::InvalidSchema, "Failed to parse Avro schema", err))
}
