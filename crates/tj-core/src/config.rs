//! Configuration types and parsing for journal.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path value that selects an in-memory SQLite database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Main journal configuration from journal.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directory receiving exports and pre-import backups
    #[serde(default = "default_exports_dir")]
    pub exports_dir: String,

    /// Log verbosity used when neither `--verbose` nor `RUST_LOG` is set
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            exports_dir: default_exports_dir(),
            log_level: LogLevel::default(),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file path, relative to the project directory, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,

    /// How long to wait on a locked database file before giving up
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Returns `true` when the configured path selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }

    /// Busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Log verbosity levels accepted in journal.yml
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "critical")]
    Error,
    #[default]
    #[serde(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate's filter type.
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_db_path() -> String {
    "data/trading_journal.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_exports_dir() -> String {
    "exports".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for journal.yml or journal.yaml, falling back to defaults
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("journal.yml");
        let yaml_path = dir.join("journal.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            log::debug!(
                "No journal.yml in {}, using default configuration",
                dir.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        if self.exports_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "exports_dir cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the absolute database path relative to a project root.
    ///
    /// Returns `None` for in-memory databases.
    pub fn database_path_absolute(&self, root: &Path) -> Option<PathBuf> {
        if self.database.is_in_memory() {
            None
        } else {
            Some(root.join(&self.database.path))
        }
    }

    /// Get the absolute exports directory relative to a project root
    pub fn exports_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.exports_dir)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
