use crate::config::load_poller_config;
use crate::core::start_poller_with_config;
use ::config::shared::{PollerConfig, TaskConfig};
use telemetry::init_tracing;
use tracing::error;

mod config;
mod core;
mod migrations;

fn main() -> anyhow::Result<()> {
    let (poller_config, tasks) = load_poller_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(poller_config, tasks))?;

    Ok(())
}

async fn async_main(poller_config: PollerConfig, tasks: Vec<TaskConfig>) -> anyhow::Result<()> {
    if let Err(err) = start_poller_with_config(poller_config, tasks).await {
        error!("an error occurred in the poller: {err}");

        return Err(err);
    }

    Ok(())
}
