//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tj_core::{Config, LogLevel};
use tj_store::{JournalDb, MigrationRegistry};

use crate::cli::GlobalArgs;

/// Loaded configuration plus the paths every command resolves against.
pub(crate) struct RuntimeContext {
    pub config: Config,
    pub project_dir: PathBuf,
}

impl RuntimeContext {
    /// Load configuration and install the logger.
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project_dir = PathBuf::from(&args.project_dir);

        let mut config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&project_dir).context("Failed to load project configuration")?
        };
        if let Some(database) = &args.database {
            config.database.path = database.clone();
        }

        init_logging(args.verbose, config.log_level);

        Ok(Self {
            config,
            project_dir,
        })
    }

    /// Database file, `None` when configured in memory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.config.database_path_absolute(&self.project_dir)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.config.exports_dir_absolute(&self.project_dir)
    }

    /// Open the journal, creating the file and its directory if needed.
    pub fn open_db(&self) -> Result<JournalDb> {
        match self.database_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory: {}", parent.display())
                    })?;
                }
                JournalDb::open(&path, &self.config.database)
                    .with_context(|| format!("Failed to open database {}", path.display()))
            }
            None => JournalDb::open_memory().context("Failed to open in-memory database"),
        }
    }

    /// Open a journal that must already exist.
    pub fn open_existing_db(&self) -> Result<JournalDb> {
        if let Some(path) = self.database_path() {
            if !path.exists() {
                anyhow::bail!(
                    "Database {} does not exist. Run `tj init` first.",
                    path.display()
                );
            }
        }
        self.open_db()
    }

    /// Human-readable location of the database.
    pub fn database_label(&self) -> String {
        self.database_path()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }
}

/// The built-in migration steps.
pub(crate) fn registry() -> Result<MigrationRegistry> {
    MigrationRegistry::builtin().context("Failed to build the migration registry")
}

/// `--verbose` wins, then `RUST_LOG`, then the configured level.
fn init_logging(verbose: bool, configured: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(configured.to_filter());
    builder.parse_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // A logger may already be installed when commands run inside tests.
    let _ = builder.try_init();
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
