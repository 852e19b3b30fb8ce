use rust_cli_config::{ConfigError, File, FileFormat};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::environment::Environment;
use crate::shared::TaskConfig;

/// Directory containing configuration files relative to application root.
const CONFIGURATION_DIR: &str = "configuration";

/// Base configuration file loaded for all environments.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_KAFKA__BOOTSTRAP_SERVERS` sets the `kafka.bootstrap_servers` field.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// File extensions recognized as task configuration files.
const TASK_FILE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Trait defining the keys that should be parsed as lists in a given [`Config`]
/// implementation.
pub trait Config {
    /// Keys parsed as lists when loading the configuration from environment variables.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads hierarchical configuration from YAML files and environment variables.
///
/// Loads configuration in this order:
/// 1. Base configuration from `configuration/base.yaml`
/// 2. Environment-specific file from `configuration/{environment}.yaml`
/// 3. Environment variable overrides prefixed with `APP`
///
/// Nested keys use double underscores: `APP_SOURCE__HOST` → `source.host` and lists are
/// separated by `,`.
pub fn load_config<T>() -> Result<T, ConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(|err| ConfigError::Foreign(Box::new(err)))?;
    let environment = Environment::load().map_err(|err| ConfigError::Foreign(Box::new(err)))?;

    load_config_from(&base_path.join(CONFIGURATION_DIR), environment)
}

/// Loads configuration from `directory` for the given `environment`.
///
/// Same layering as [`load_config`] with an explicit directory.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, ConfigError>
where
    T: Config + DeserializeOwned,
{
    let environment_filename = format!("{environment}.yaml");

    let mut environment_source = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !<T as Config>::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in <T as Config>::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let settings = rust_cli_config::Config::builder()
        .add_source(File::from(directory.join(BASE_CONFIG_FILE)))
        .add_source(File::from(directory.join(environment_filename)).required(false))
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}

/// Loads a single task definition from a YAML file.
pub fn load_task_config(path: &Path) -> Result<TaskConfig, ConfigError> {
    rust_cli_config::Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml))
        .build()?
        .try_deserialize::<TaskConfig>()
}

/// Loads every task definition found directly inside `directory`.
///
/// Only files ending in `.yaml` or `.yml` are read; subdirectories are not
/// descended into. Files are loaded in name order.
pub fn load_task_configs(directory: &Path) -> Result<Vec<TaskConfig>, ConfigError> {
    let mut paths = task_files(directory).map_err(|err| ConfigError::Foreign(Box::new(err)))?;
    paths.sort();

    paths.iter().map(|path| load_task_config(path)).collect()
}

fn task_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| TASK_FILE_EXTENSIONS.contains(&extension));
        if is_yaml {
            paths.push(path);
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("relay-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_only_yaml_files_from_the_top_level() {
        let dir = temp_dir();
        fs::write(
            dir.join("b_orders.yaml"),
            "name: orders\nquery_file: queries/orders.sql\ntopic: orders\nschema: orders-value\ninterval_ms: 5000\n",
        )
        .unwrap();
        fs::write(
            dir.join("a_users.yml"),
            "name: users\nquery_file: queries/user.sql\ntopic: users\nschema: users-value\ninterval_ms: 1000\nrecord: user\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not a task").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(
            dir.join("nested").join("ignored.yaml"),
            "name: ignored\nquery_file: q.sql\ntopic: t\nschema: s\ninterval_ms: 1\n",
        )
        .unwrap();

        let tasks = load_task_configs(&dir).unwrap();

        let names: Vec<_> = tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders"]);
        assert_eq!(tasks[0].record.as_deref(), Some("user"));
        assert_eq!(tasks[1].interval_ms, 5000);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_task_directory_is_an_error() {
        let dir = std::env::temp_dir().join(format!("relay-missing-{}", uuid::Uuid::new_v4()));

        assert!(load_task_configs(&dir).is_err());
    }

    #[test]
    fn malformed_task_file_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("broken.yaml");
        fs::write(&path, "name: users\ntopic: users\n").unwrap();

        assert!(load_task_config(&path).is_err());

        fs::remove_dir_all(dir).unwrap();
    }
}
