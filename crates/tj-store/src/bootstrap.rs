//! Base tables and seed rows, created after migration.
//!
//! Bootstrap only ever creates what is missing. It runs after the runner so a
//! brand-new file and an upgraded legacy file end up with the same tables,
//! both rendered from the column manifest.

use crate::connection::JournalDb;
use crate::ddl::{TableDef, FUTURES_PRICES, MANIFEST, PRODUCTS, SMM_PRICES, TRADES};
use crate::error::{StoreError, StoreResult};
use crate::introspect::{list_columns, table_exists, table_row_count};
use rusqlite::{params, Connection};
use serde::Serialize;

/// Tables bootstrap owns; the rest are created by steps.
pub const BOOTSTRAP_TABLES: &[TableDef] = &[TRADES, SMM_PRICES, FUTURES_PRICES, PRODUCTS];

/// `(name, exchange)` rows inserted into an empty `products` table.
pub const DEFAULT_PRODUCTS: &[(&str, &str)] = &[("工碳", "gfex"), ("电碳", "gfex")];

/// What a bootstrap run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub created_tables: Vec<String>,
    pub seeded_products: usize,
}

pub struct BootstrapInitializer<'a> {
    db: &'a JournalDb,
}

impl<'a> BootstrapInitializer<'a> {
    pub fn new(db: &'a JournalDb) -> Self {
        Self { db }
    }

    /// Create missing base tables and seed default products, in one
    /// transaction. Existing tables are never altered.
    pub fn run(&self) -> StoreResult<BootstrapReport> {
        self.db.transaction(|conn| {
            let mut report = BootstrapReport::default();
            for table in BOOTSTRAP_TABLES {
                if table_exists(conn, table.name)? {
                    continue;
                }
                conn.execute_batch(&table.create_if_absent_sql())
                    .map_err(|e| {
                        StoreError::QueryError(format!("failed to create {}: {e}", table.name))
                    })?;
                log::info!("Created table {}", table.name);
                report.created_tables.push(table.name.to_string());
            }

            report.seeded_products = seed_products(conn)?;
            Ok(report)
        })
    }

    /// Compare every manifest table present in the database with its
    /// manifest columns.
    pub fn verify(&self) -> StoreResult<()> {
        verify_schema(self.db.conn())
    }
}

fn seed_products(conn: &Connection) -> StoreResult<usize> {
    if table_row_count(conn, PRODUCTS.name)? > 0 {
        return Ok(0);
    }
    for (name, exchange) in DEFAULT_PRODUCTS {
        conn.execute(
            "INSERT INTO products (name, exchange, created_at, updated_at) \
             VALUES (?1, ?2, datetime('now'), datetime('now'))",
            params![name, exchange],
        )
        .map_err(|e| StoreError::QueryError(format!("failed to seed product {name}: {e}")))?;
    }
    log::info!("Seeded {} default products", DEFAULT_PRODUCTS.len());
    Ok(DEFAULT_PRODUCTS.len())
}

/// Fails with [`StoreError::SchemaDrift`] on the first table whose columns
/// differ from the manifest. Tables not yet created are not checked.
pub fn verify_schema(conn: &Connection) -> StoreResult<()> {
    for table in MANIFEST {
        let actual = list_columns(conn, table.name)?;
        if actual.is_empty() {
            continue;
        }
        let expected = table.column_names();

        let missing: Vec<String> = expected
            .iter()
            .filter(|name| !actual.iter().any(|a| a.eq_ignore_ascii_case(name)))
            .map(|name| name.to_string())
            .collect();
        let unexpected: Vec<String> = actual
            .iter()
            .filter(|a| !expected.iter().any(|name| a.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(StoreError::SchemaDrift {
                table: table.name.to_string(),
                missing,
                unexpected,
            });
        }
    }
    log::debug!("Schema matches the column manifest");
    Ok(())
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
