//! v001: supplier and settlement columns on `trades`.

use super::{has_column, rebuild_table};
use crate::ddl::{TRADES, TRADES_V0, TRADE_SUPPLIER_COLUMNS};
use crate::error::StoreResult;
use crate::step::{MigrationStep, StepContext};

/// Adds each supplier column that is missing.
///
/// Re-running it on a table that already has the columns does nothing, which
/// keeps it safe against hand-edited databases. A database without `trades`
/// is left alone: bootstrap creates the table with these columns included.
pub struct AddSupplierFields;

impl MigrationStep for AddSupplierFields {
    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "add supplier fields to trades"
    }

    fn apply(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        if !ctx.table_exists(TRADES.name)? {
            log::debug!("No trades table yet, supplier columns come with bootstrap");
            return Ok(());
        }

        let existing = ctx.list_columns(TRADES.name)?;
        for column in TRADE_SUPPLIER_COLUMNS {
            if has_column(&existing, column.name) {
                continue;
            }
            ctx.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                TRADES.name, column.name, column.decl
            ))?;
            log::info!("Added column {}.{}", TRADES.name, column.name);
        }
        Ok(())
    }

    /// SQLite cannot drop these columns in place, so the table is rebuilt
    /// without them.
    fn revert(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        if !ctx.table_exists(TRADES.name)? {
            return Ok(());
        }
        let copy = TRADES_V0.column_names();
        rebuild_table(ctx, &TRADES_V0, "trades_temp", &copy)?;
        log::info!("Rebuilt trades without supplier columns");
        Ok(())
    }
}
