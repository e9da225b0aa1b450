//! Migrate command implementation

use anyhow::{Context, Result};
use tj_store::{MigrationOutcome, MigrationRunner};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{version_label, version_list};
use crate::context::{registry, RuntimeContext};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let registry = registry()?;
    let db = ctx.open_db()?;

    let outcome = MigrationRunner::new(&db, &registry)
        .migrate(args.target)
        .context("Migration failed")?;

    match outcome {
        MigrationOutcome::AlreadyCurrent { version } => {
            println!("Schema is already at {}", version_label(version));
        }
        MigrationOutcome::Migrated {
            from,
            to,
            applied,
            skipped,
        } => {
            println!(
                "Migrated {} -> {} (applied: {})",
                version_label(from),
                version_label(to),
                version_list(&applied)
            );
            if !skipped.is_empty() {
                println!("  Skipped unregistered: {}", version_list(&skipped));
            }
        }
    }
    Ok(())
}
