// Configuration for the tasktrack CLI

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "tasktrack";
const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_DB_FILE: &str = "tasks.db";

/// CLI configuration, read from `<config dir>/tasktrack/config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection string passed to [`Store::open`](crate::Store::open)
    pub database: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database().to_string_lossy().into_owned(),
        }
    }
}

impl Config {
    /// Load the config from the default location, or defaults if it is absent
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load the config from `path`
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context(format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))?;

        debug!(path = ?path, database = %config.database, "Loaded config");
        Ok(config)
    }
}

/// `<config dir>/tasktrack/config.yaml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// `<data dir>/tasktrack/tasks.db`, falling back to `./tasks.db`
pub fn default_database() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR).join(DEFAULT_DB_FILE),
        None => PathBuf::from(DEFAULT_DB_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.database.ends_with(DEFAULT_DB_FILE));
    }

    #[test]
    fn test_load_database_from_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "database: /var/lib/tasks/tasks.db\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database, "/var/lib/tasks/tasks.db");
    }

    #[test]
    fn test_empty_yaml_mapping_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "{}\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "database: [unterminated\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
