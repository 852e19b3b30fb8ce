use crate::migrations::migrate_checkpoint_store;
use config::shared::{
    KafkaConfig, PgConnectionConfig, PollerConfig, SchemaRegistryConfig, TaskConfig,
};
use relay::encoding::{AvroEncoder, HttpSchemaRegistry, SchemaStrategy};
use relay::pipeline::Pipeline;
use relay::publisher::{KafkaPublisher, Publisher};
use relay::store::PostgresCheckpointStore;
use relay::task::{Runnable, create_task};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use telemetry::init_metrics;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

/// Starts the poller with the given configuration and runs it until a
/// shutdown signal is received.
///
/// Tasks whose query cannot be loaded or whose record type is unknown are
/// skipped; the poller only fails to start when none of them can be created.
pub async fn start_poller_with_config(
    poller_config: PollerConfig,
    tasks: Vec<TaskConfig>,
) -> anyhow::Result<()> {
    info!("starting poller service");

    log_config(&poller_config, &tasks);

    if let Some(address) = poller_config.metrics_address {
        init_metrics(address, env!("CARGO_PKG_NAME"))?;
        info!(%address, "prometheus metrics endpoint started");
    }

    migrate_checkpoint_store(&poller_config.source).await?;

    let pool = init_pool(&poller_config.source).await?;
    let store = PostgresCheckpointStore::new(pool.clone());

    let registry = HttpSchemaRegistry::new(&poller_config.schema_registry)?;
    let strategy = if poller_config.schema_registry.auto_register {
        SchemaStrategy::AutoRegister
    } else {
        SchemaStrategy::Latest
    };
    let encoder = AvroEncoder::new(registry, strategy);

    // One producer is shared by every task, librdkafka handles concurrent sends.
    let publisher = KafkaPublisher::new(&poller_config.kafka)?;

    let mut registered = Vec::with_capacity(tasks.len());
    for task_config in tasks {
        let name = task_config.name.clone();
        match create_task(
            task_config,
            pool.clone(),
            store.clone(),
            encoder.clone(),
            publisher.clone(),
        ) {
            Ok(task) => registered.push(task),
            Err(err) => warn!(task = %name, error = %err, "failed to create task, skipping it"),
        }
    }

    if registered.is_empty() {
        anyhow::bail!("none of the configured tasks could be created");
    }

    let pipeline = Pipeline::new(registered)?;
    info!(tasks = ?pipeline.task_names().collect::<Vec<_>>(), "pipeline created");
    let result = start_pipeline(pipeline).await;

    info!("flushing pending messages");
    if let Err(err) = publisher.close().await {
        warn!(error = %err, "failed to flush pending messages");
    }

    pool.close().await;

    result?;

    info!("poller service completed");

    Ok(())
}

fn log_config(config: &PollerConfig, tasks: &[TaskConfig]) {
    log_pg_connection_config(&config.source);
    log_kafka_config(&config.kafka);
    log_schema_registry_config(&config.schema_registry);
    for task in tasks {
        log_task_config(task);
    }
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        max_connections = config.max_connections,
        "source postgres connection config",
    );
}

fn log_kafka_config(config: &KafkaConfig) {
    debug!(
        bootstrap_servers = config.bootstrap_servers,
        client_id = ?config.client_id,
        message_timeout_ms = config.message_timeout_ms,
        extra_properties = config.properties.len(),
        "kafka producer config"
    );
}

fn log_schema_registry_config(config: &SchemaRegistryConfig) {
    debug!(
        url = config.url,
        username = ?config.username,
        timeout_ms = config.timeout_ms,
        auto_register = config.auto_register,
        "schema registry config"
    );
}

fn log_task_config(config: &TaskConfig) {
    debug!(
        name = config.name,
        record = config.record_name(),
        query_file = config.query_file,
        topic = config.topic,
        schema = config.schema,
        interval_ms = config.interval_ms,
        checkpoint_policy = ?config.checkpoint_policy,
        "task config"
    );
}

async fn init_pool(config: &PgConnectionConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.with_db())
        .await?;

    Ok(pool)
}

/// Starts the pipeline and shuts it down on SIGTERM or SIGINT.
///
/// Runs in progress when the signal arrives are allowed to finish.
async fn start_pipeline<T: Runnable>(mut pipeline: Pipeline<T>) -> anyhow::Result<()> {
    pipeline.start().await?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, shutting down poller");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down poller");
            }
        }

        shutdown_tx.shutdown();
    });

    let result = pipeline.wait().await;

    // The runners only return after shutdown, so the signal task is done or
    // no longer needed.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    result?;

    Ok(())
}
