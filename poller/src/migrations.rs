use config::shared::PgConnectionConfig;
use sqlx::{
    Executor,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

/// Number of database connections to use for the migration pool.
const NUM_POOL_CONNECTIONS: u32 = 1;

/// Creates the `relay` schema and the checkpoint table.
///
/// The sqlx migration metadata is kept in the `relay` schema as well, so the
/// public schema of the polled database stays untouched.
pub async fn migrate_checkpoint_store(
    connection_config: &PgConnectionConfig,
) -> Result<(), sqlx::Error> {
    let options: PgConnectOptions = connection_config.with_db();

    let pool = PgPoolOptions::new()
        .max_connections(NUM_POOL_CONNECTIONS)
        .min_connections(NUM_POOL_CONNECTIONS)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("create schema if not exists relay;").await?;
                conn.execute("set search_path = 'relay';").await?;

                Ok(())
            })
        })
        .connect_with(options)
        .await?;

    info!("applying checkpoint store migrations");

    let migrator = sqlx::migrate!("./migrations");
    migrator.run(&pool).await?;

    info!("checkpoint store migrations applied");

    Ok(())
}
