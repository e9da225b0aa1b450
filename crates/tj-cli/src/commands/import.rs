//! Import command implementation
//!
//! `.db` files replace the store file and are migrated in place; anything
//! else is read as a JSON snapshot and loaded row by row.

use anyhow::{Context, Result};
use std::path::Path;
use tj_store::sync::{self, ImportMode};

use crate::cli::{GlobalArgs, ImportArgs};
use crate::commands::common::{version_label, ExitCode};
use crate::context::{registry, RuntimeContext};

/// Execute the import command
pub(crate) fn execute(args: &ImportArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let source = Path::new(&args.path);
    if !source.is_file() {
        anyhow::bail!("Import file {} does not exist", source.display());
    }

    if is_database_file(source) {
        import_database(args, &ctx, source)
    } else {
        import_json(args, &ctx, source)
    }
}

fn is_database_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("db"))
}

fn import_database(args: &ImportArgs, ctx: &RuntimeContext, source: &Path) -> Result<()> {
    if args.merge {
        anyhow::bail!("--merge only applies to JSON snapshots");
    }
    let Some(target) = ctx.database_path() else {
        anyhow::bail!("Cannot import a database file into an in-memory store");
    };
    let registry = registry()?;
    let backups = ctx.exports_dir();
    let backups_dir = (!args.no_backup).then_some(backups.as_path());

    let report = sync::import_database(
        source,
        &target,
        &ctx.config.database,
        &registry,
        backups_dir,
    )
    .with_context(|| format!("Failed to import {}", source.display()))?;

    if let Some(backup) = &report.backup {
        println!("Backed up previous store to {}", backup.display());
    }
    println!(
        "Imported {} into {} (schema {})",
        source.display(),
        target.display(),
        version_label(report.migration.version())
    );
    Ok(())
}

fn import_json(args: &ImportArgs, ctx: &RuntimeContext, source: &Path) -> Result<()> {
    let registry = registry()?;
    let db = ctx.open_db()?;
    tj_store::initialize(&db, &registry).context("Failed to initialize the journal")?;

    let mode = if args.merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };
    let backups = ctx.exports_dir();
    let backups_dir = (!args.no_backup).then_some(backups.as_path());

    let report = sync::import_json(&db, &registry, source, mode, backups_dir)
        .with_context(|| format!("Failed to import {}", source.display()))?;

    if let Some(backup) = &report.backup {
        println!("Backed up previous store to {}", backup.display());
    }
    println!(
        "Imported {} rows into {} tables from a schema {} snapshot",
        report.rows_imported,
        report.tables_imported.len(),
        version_label(report.snapshot_schema_version)
    );
    if !report.tables_skipped.is_empty() {
        println!("  Skipped tables: {}", report.tables_skipped.join(", "));
    }
    if let Some(migration) = &report.migration {
        println!("  Migrated to {}", version_label(migration.version()));
    }
    if report.rows_skipped == 0 {
        return Ok(());
    }
    match mode {
        ImportMode::Merge => {
            println!(
                "  {} rows already present or rejected",
                report.rows_skipped
            );
            Ok(())
        }
        ImportMode::Replace => {
            eprintln!("  {} rows could not be imported (see warnings)", report.rows_skipped);
            Err(ExitCode(2).into())
        }
    }
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
