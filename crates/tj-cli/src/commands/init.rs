//! Init command implementation - brings the journal to the current schema

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::version_label;
use crate::context::{registry, RuntimeContext};

/// Execute the init command: migrate, bootstrap, verify.
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let registry = registry()?;
    let db = ctx.open_db()?;

    let report = tj_store::initialize(&db, &registry).context("Failed to initialize the journal")?;

    println!(
        "Journal ready at {} (schema {})",
        ctx.database_label(),
        version_label(report.migration.version())
    );
    if !report.bootstrap.created_tables.is_empty() {
        println!(
            "  Created tables: {}",
            report.bootstrap.created_tables.join(", ")
        );
    }
    if report.bootstrap.seeded_products > 0 {
        println!(
            "  Seeded {} default products",
            report.bootstrap.seeded_products
        );
    }
    Ok(())
}
