use config::shared::{PollerConfig, TaskConfig};
use config::{load_config, load_task_configs};
use std::path::Path;

/// Loads the [`PollerConfig`] together with every task it defines.
///
/// Inline tasks come first, followed by the task files of `tasks_dir` in name
/// order. The merged set is validated before it is returned.
pub fn load_poller_config() -> anyhow::Result<(PollerConfig, Vec<TaskConfig>)> {
    let config = load_config::<PollerConfig>()?;

    let mut tasks = config.tasks.clone();
    if let Some(tasks_dir) = &config.tasks_dir {
        tasks.extend(load_task_configs(Path::new(tasks_dir))?);
    }

    config.validate(&tasks)?;

    Ok((config, tasks))
}
