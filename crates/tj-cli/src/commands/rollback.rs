//! Rollback command implementation

use anyhow::{Context, Result};
use tj_store::{MigrationRunner, RollbackOutcome};

use crate::cli::{GlobalArgs, RollbackArgs};
use crate::commands::common::{version_label, version_list};
use crate::context::{registry, RuntimeContext};

/// Execute the rollback command
pub(crate) fn execute(args: &RollbackArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let registry = registry()?;
    let db = ctx.open_existing_db()?;

    let outcome = MigrationRunner::new(&db, &registry)
        .rollback(args.target)
        .context("Rollback failed")?;

    match outcome {
        RollbackOutcome::NothingToRollBack { version } => {
            println!(
                "Nothing to roll back: schema is at {}",
                version_label(version)
            );
        }
        RollbackOutcome::RolledBack { from, to, reverted } => {
            println!(
                "Rolled back {} -> {} (reverted: {})",
                version_label(from),
                version_label(to),
                version_list(&reverted)
            );
        }
    }
    Ok(())
}
