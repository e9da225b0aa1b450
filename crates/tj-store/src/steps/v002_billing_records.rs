//! v002: the `billing_records` table, renaming `billing_date` to
//! `billing_month` in tables created by early releases.

use super::has_column;
use crate::ddl::BILLING_RECORDS;
use crate::error::{StoreError, StoreResult};
use crate::step::{ColumnRename, MigrationStep, StepContext};

/// Name the legacy table is parked under while rows are copied.
const LEGACY_TABLE: &str = "billing_records_old";

/// Canonical column ← legacy column.
const LEGACY_COLUMN_MAP: &[(&str, &str)] = &[
    ("id", "id"),
    ("trade_id", "trade_id"),
    ("billing_month", "billing_date"),
    ("base_month", "base_month"),
    ("base_price", "base_price"),
    ("settlement_price", "settlement_price"),
    ("quantity", "quantity"),
    ("physical_tons", "physical_tons"),
    ("settlement_amount", "settlement_amount"),
    ("discount", "discount"),
    ("notes", "notes"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

const RENAMES: &[ColumnRename] = &[ColumnRename {
    table: "billing_records",
    from: "billing_date",
    to: "billing_month",
}];

pub struct AddBillingRecords;

impl MigrationStep for AddBillingRecords {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "add billing records table"
    }

    fn apply(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        let columns = ctx.list_columns(BILLING_RECORDS.name)?;
        if has_column(&columns, "billing_date") && !has_column(&columns, "billing_month") {
            if ctx.table_exists(LEGACY_TABLE)? {
                return Err(StoreError::LegacyConflict(format!(
                    "{} has the legacy layout but {LEGACY_TABLE} already exists",
                    BILLING_RECORDS.name
                )));
            }
            ctx.execute_batch(&format!(
                "ALTER TABLE {} RENAME TO {LEGACY_TABLE}",
                BILLING_RECORDS.name
            ))?;
            log::info!("Renamed table {} -> {LEGACY_TABLE}", BILLING_RECORDS.name);
        }

        ctx.execute_batch(&BILLING_RECORDS.create_if_absent_sql())?;

        // Tables created by the billing module itself predate related_po.
        if !has_column(&ctx.list_columns(BILLING_RECORDS.name)?, "related_po") {
            ctx.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN related_po TEXT",
                BILLING_RECORDS.name
            ))?;
            log::info!("Added column {}.related_po", BILLING_RECORDS.name);
        }

        if ctx.table_exists(LEGACY_TABLE)? {
            copy_legacy_rows(ctx)?;
        }

        log::info!("Table {} is ready", BILLING_RECORDS.name);
        Ok(())
    }

    fn revert(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        ctx.execute_batch(&format!("DROP TABLE IF EXISTS {}", BILLING_RECORDS.name))?;
        log::info!("Dropped table {}", BILLING_RECORDS.name);
        Ok(())
    }

    fn column_renames(&self) -> &'static [ColumnRename] {
        RENAMES
    }
}

/// Copy parked legacy rows into the canonical table and drop the parked one.
///
/// Legacy columns that never existed are filled with NULL; a NOT NULL target
/// then fails the insert and with it the whole step.
fn copy_legacy_rows(ctx: &StepContext<'_>) -> StoreResult<()> {
    let legacy_columns = ctx.list_columns(LEGACY_TABLE)?;
    let (targets, sources): (Vec<&str>, Vec<&str>) = LEGACY_COLUMN_MAP
        .iter()
        .map(|&(target, source)| {
            if has_column(&legacy_columns, source) {
                (target, source)
            } else {
                (target, "NULL")
            }
        })
        .unzip();

    let copied = ctx.row_count(LEGACY_TABLE)?;
    ctx.execute_batch(&format!(
        "INSERT INTO {} ({}) SELECT {} FROM {LEGACY_TABLE};
         DROP TABLE {LEGACY_TABLE};",
        BILLING_RECORDS.name,
        targets.join(", "),
        sources.join(", ")
    ))?;
    log::info!("Migrated {copied} legacy billing rows and dropped {LEGACY_TABLE}");
    Ok(())
}
