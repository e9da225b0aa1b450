//! v003: physical purchases and their links to trades.
//!
//! Replaces the unversioned "add premium or rebuild" check the purchase
//! module used to run on every start.

use super::{has_column, rebuild_table};
use crate::ddl::{PHYSICAL_PURCHASES, PURCHASE_TRADE_RELATIONS};
use crate::error::{StoreError, StoreResult};
use crate::step::{MigrationStep, StepContext};

/// Scratch table name, shared with the old purchase module's rebuild.
const SCRATCH_TABLE: &str = "physical_purchases_new";

pub struct ConsolidatePhysicalPurchases;

impl MigrationStep for ConsolidatePhysicalPurchases {
    fn version(&self) -> u32 {
        3
    }

    fn description(&self) -> &'static str {
        "consolidate physical purchase tables"
    }

    fn apply(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        clear_scratch_table(ctx)?;

        let columns = ctx.list_columns(PHYSICAL_PURCHASES.name)?;
        if columns.is_empty() {
            ctx.execute_batch(&PHYSICAL_PURCHASES.create_if_absent_sql())?;
            log::info!("Created table {}", PHYSICAL_PURCHASES.name);
        } else if !has_column(&columns, "premium") {
            let copy: Vec<&str> = PHYSICAL_PURCHASES
                .column_names()
                .into_iter()
                .filter(|name| has_column(&columns, name))
                .collect();
            rebuild_table(ctx, &PHYSICAL_PURCHASES, SCRATCH_TABLE, &copy)?;
            log::info!("Rebuilt {} with a premium column", PHYSICAL_PURCHASES.name);
        }

        ctx.execute_batch(&PURCHASE_TRADE_RELATIONS.create_if_absent_sql())?;
        Ok(())
    }

    fn revert(&self, ctx: &StepContext<'_>) -> StoreResult<()> {
        ctx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {};
             DROP TABLE IF EXISTS {};",
            PURCHASE_TRADE_RELATIONS.name, PHYSICAL_PURCHASES.name
        ))?;
        log::info!(
            "Dropped tables {} and {}",
            PURCHASE_TRADE_RELATIONS.name,
            PHYSICAL_PURCHASES.name
        );
        Ok(())
    }
}

/// Deal with a scratch table left behind by the old purchase module.
///
/// It created the scratch table on every start, so an empty one next to the
/// real table is just litter. A scratch table without the real one is an
/// interrupted rebuild whose data only lives in the scratch copy.
fn clear_scratch_table(ctx: &StepContext<'_>) -> StoreResult<()> {
    if !ctx.table_exists(SCRATCH_TABLE)? {
        return Ok(());
    }

    if !ctx.table_exists(PHYSICAL_PURCHASES.name)? {
        ctx.execute_batch(&format!(
            "ALTER TABLE {SCRATCH_TABLE} RENAME TO {}",
            PHYSICAL_PURCHASES.name
        ))?;
        log::warn!(
            "Recovered {} from interrupted rebuild table {SCRATCH_TABLE}",
            PHYSICAL_PURCHASES.name
        );
        return Ok(());
    }

    if ctx.row_count(SCRATCH_TABLE)? > 0 {
        return Err(StoreError::LegacyConflict(format!(
            "both {} and a non-empty {SCRATCH_TABLE} exist",
            PHYSICAL_PURCHASES.name
        )));
    }

    ctx.execute_batch(&format!("DROP TABLE {SCRATCH_TABLE}"))?;
    log::debug!("Dropped empty leftover table {SCRATCH_TABLE}");
    Ok(())
}
