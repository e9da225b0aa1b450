//! Status command implementation

use anyhow::{Context, Result};
use tj_store::{MigrationRunner, MigrationStatus};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{version_label, ExitCode};
use crate::context::{registry, RuntimeContext};

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let registry = registry()?;
    let db = ctx.open_existing_db()?;

    let status = MigrationRunner::new(&db, &registry)
        .status()
        .context("Failed to read migration status")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?;
        println!("{json}");
    } else {
        print_status(&ctx.database_label(), &status);
    }

    if args.check && status.needs_migration {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_status(database: &str, status: &MigrationStatus) {
    println!("Database: {database}");
    println!("Current version: {}", version_label(status.current_version));
    println!("Latest version:  {}", version_label(status.latest_version));

    if status.pending_steps.is_empty() {
        println!("Pending: none");
    } else {
        println!("Pending:");
        for step in &status.pending_steps {
            println!("  {}  {}", version_label(step.version), step.description);
        }
    }

    if !status.applied_history.is_empty() {
        println!("Applied:");
        for entry in &status.applied_history {
            let applied_at = entry.applied_at.map_or_else(
                || "-".to_string(),
                |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
            );
            println!(
                "  {}  {:<19}  {:>8.3}s  {}",
                version_label(entry.version),
                applied_at,
                entry.execution_time,
                entry.description
            );
        }
    }
}
