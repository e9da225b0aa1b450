//! Export command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tj_store::sync::{self, ExportFormat};

use crate::cli::{ExportArgs, ExportFormatArg, GlobalArgs};
use crate::commands::common::version_label;
use crate::context::RuntimeContext;

/// Execute the export command
pub(crate) fn execute(args: &ExportArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let db = ctx.open_existing_db()?;

    let format = match args.format {
        ExportFormatArg::Db => ExportFormat::Db,
        ExportFormatArg::Json => ExportFormat::Json,
    };
    let output = match &args.output {
        Some(path) => PathBuf::from(path),
        None => sync::default_export_path(&ctx.exports_dir(), format, Utc::now()),
    };

    let report = match format {
        ExportFormat::Db => sync::export_database(&db, &output),
        ExportFormat::Json => sync::export_json(&db, &output),
    }
    .with_context(|| format!("Failed to export to {}", output.display()))?;

    println!(
        "Exported schema {} to {} ({} tables, {} rows)",
        version_label(report.schema_version),
        report.path.display(),
        report.tables,
        report.rows
    );
    if let Some(meta_path) = &report.meta_path {
        println!("  Metadata: {}", meta_path.display());
    }
    Ok(())
}
