//! Built-in journal migration steps, in version order.

mod v001_supplier_fields;
mod v002_billing_records;
mod v003_physical_purchases;

pub use v001_supplier_fields::AddSupplierFields;
pub use v002_billing_records::AddBillingRecords;
pub use v003_physical_purchases::ConsolidatePhysicalPurchases;

use crate::ddl::TableDef;
use crate::error::StoreResult;
use crate::step::{MigrationStep, StepContext};

/// All built-in steps. Append new steps here; never renumber or edit a
/// released one.
pub(crate) fn builtin_steps() -> Vec<Box<dyn MigrationStep>> {
    vec![
        Box::new(AddSupplierFields),
        Box::new(AddBillingRecords),
        Box::new(ConsolidatePhysicalPurchases),
    ]
}

/// SQLite column names compare case-insensitively.
pub(crate) fn has_column(columns: &[String], name: &str) -> bool {
    columns.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Rebuild `def.name` into `def`'s shape: create `scratch`, copy
/// `copy_columns` across, drop the original and rename `scratch` into place.
///
/// Columns of the original that are not in `copy_columns` are lost.
pub(crate) fn rebuild_table(
    ctx: &StepContext<'_>,
    def: &TableDef,
    scratch: &str,
    copy_columns: &[&str],
) -> StoreResult<()> {
    let columns = copy_columns.join(", ");
    ctx.execute_batch(&def.create_as_sql(scratch))?;
    ctx.execute_batch(&format!(
        "INSERT INTO {scratch} ({columns}) SELECT {columns} FROM {table};
         DROP TABLE {table};
         ALTER TABLE {scratch} RENAME TO {table};",
        table = def.name
    ))?;
    Ok(())
}

#[cfg(test)]
#[path = "steps_test.rs"]
mod tests;
