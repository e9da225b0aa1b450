//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// tj - schema migrations and data sync for the trade journal
#[derive(Parser, Debug)]
#[command(name = "tj")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database file (or `:memory:`)
    #[arg(short, long, global = true, env = "TJ_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate, create base tables and verify the schema
    Init,

    /// Apply pending migration steps
    Migrate(MigrateArgs),

    /// Revert migration steps down to a target version
    Rollback(RollbackArgs),

    /// Show the schema version and pending steps
    Status(StatusArgs),

    /// Export the journal to a database copy or a JSON snapshot
    Export(ExportArgs),

    /// Import a database copy (.db) or a JSON snapshot
    Import(ImportArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Version to migrate to (default: latest)
    #[arg(short, long)]
    pub target: Option<u32>,
}

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Version to roll back to; steps above it are reverted
    pub target: u32,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 when migrations are pending
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value = "db")]
    pub format: ExportFormatArg,

    /// Output path (default: a timestamped file in the exports directory)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Export formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormatArg {
    /// Copy of the database file plus a metadata sidecar
    Db,
    /// JSON snapshot of every table
    Json,
}

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// File to import; `.db` files replace the store, anything else is read as JSON
    pub path: String,

    /// Keep existing rows and ignore conflicting ones (JSON only)
    #[arg(long)]
    pub merge: bool,

    /// Skip the backup of the current store
    #[arg(long)]
    pub no_backup: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
