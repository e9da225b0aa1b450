//! Tests for the built-in steps, applied directly against a connection.

use super::*;
use crate::ddl::{BILLING_RECORDS, PHYSICAL_PURCHASES, TRADES, TRADES_V0};
use crate::error::StoreError;
use crate::introspect::{list_columns, table_exists};
use rusqlite::Connection;

fn conn() -> Connection {
    Connection::open_in_memory().unwrap()
}

fn legacy_trades(conn: &Connection) {
    conn.execute_batch(&TRADES_V0.create_if_absent_sql()).unwrap();
    conn.execute(
        "INSERT INTO trades (trade_date, exchange, product_name, contract, direction, \
         entry_price, quantity, status) \
         VALUES ('2024-01-05', 'gfex', '工碳', 'SI2405', 'buy', 12500, 3, 'open')",
        [],
    )
    .unwrap();
}

const LEGACY_BILLING: &str = "CREATE TABLE billing_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trade_id INTEGER NOT NULL,
    billing_date TEXT NOT NULL,
    base_month TEXT NOT NULL,
    base_price REAL NOT NULL,
    settlement_price REAL NOT NULL,
    quantity REAL NOT NULL,
    physical_tons REAL NOT NULL,
    settlement_amount REAL NOT NULL,
    discount REAL NOT NULL,
    notes TEXT,
    created_at TEXT,
    updated_at TEXT
)";

const LEGACY_PHYSICAL: &str = "CREATE TABLE physical_purchases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    purchase_date TEXT NOT NULL,
    supplier TEXT,
    product_name TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit_price REAL,
    total_amount REAL NOT NULL,
    po_number TEXT,
    delivery_date TEXT,
    status TEXT DEFAULT 'pending',
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

#[test]
fn builtin_steps_are_numbered_from_one() {
    let versions: Vec<u32> = builtin_steps().iter().map(|s| s.version()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[test]
fn has_column_ignores_case() {
    let columns = vec!["Premium".to_string()];
    assert!(has_column(&columns, "premium"));
    assert!(!has_column(&columns, "supplier"));
}

#[test]
fn supplier_fields_are_added_once() {
    let conn = conn();
    legacy_trades(&conn);
    let ctx = StepContext::new(&conn);

    AddSupplierFields.apply(&ctx).unwrap();
    AddSupplierFields.apply(&ctx).unwrap();

    assert_eq!(list_columns(&conn, "trades").unwrap(), TRADES.column_names());
}

#[test]
fn supplier_fields_skip_missing_trades_table() {
    let conn = conn();
    AddSupplierFields.apply(&StepContext::new(&conn)).unwrap();
    assert!(!table_exists(&conn, "trades").unwrap());
}

#[test]
fn supplier_fields_fill_only_the_missing_columns() {
    let conn = conn();
    legacy_trades(&conn);
    conn.execute_batch("ALTER TABLE trades ADD COLUMN supplier TEXT")
        .unwrap();

    AddSupplierFields.apply(&StepContext::new(&conn)).unwrap();

    let columns = list_columns(&conn, "trades").unwrap();
    assert_eq!(columns.iter().filter(|c| *c == "supplier").count(), 1);
    assert!(columns.contains(&"related_po".to_string()));
}

#[test]
fn supplier_fields_revert_keeps_rows() {
    let conn = conn();
    legacy_trades(&conn);
    let ctx = StepContext::new(&conn);
    AddSupplierFields.apply(&ctx).unwrap();
    conn.execute("UPDATE trades SET supplier = 'acme'", []).unwrap();

    AddSupplierFields.revert(&ctx).unwrap();

    assert_eq!(list_columns(&conn, "trades").unwrap(), TRADES_V0.column_names());
    let contract: String = conn
        .query_row("SELECT contract FROM trades", [], |row| row.get(0))
        .unwrap();
    assert_eq!(contract, "SI2405");
    assert!(!table_exists(&conn, "trades_temp").unwrap());
}

#[test]
fn billing_records_created_when_absent() {
    let conn = conn();
    AddBillingRecords.apply(&StepContext::new(&conn)).unwrap();

    assert_eq!(
        list_columns(&conn, "billing_records").unwrap(),
        BILLING_RECORDS.column_names()
    );
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM billing_records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn legacy_billing_rows_are_renamed_and_copied() {
    let conn = conn();
    conn.execute_batch(LEGACY_BILLING).unwrap();
    conn.execute(
        "INSERT INTO billing_records (id, trade_id, billing_date, base_month, base_price, \
         settlement_price, quantity, physical_tons, settlement_amount, discount, notes) \
         VALUES (4, 9, '2024-05', '2024-04', 1000, 900, 2, 2.5, 1800, 1.5, 'checked')",
        [],
    )
    .unwrap();

    AddBillingRecords.apply(&StepContext::new(&conn)).unwrap();

    assert!(!table_exists(&conn, "billing_records_old").unwrap());
    assert_eq!(
        list_columns(&conn, "billing_records").unwrap(),
        BILLING_RECORDS.column_names()
    );
    let (id, month, notes, po): (i64, String, String, Option<String>) = conn
        .query_row(
            "SELECT id, billing_month, notes, related_po FROM billing_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(id, 4);
    assert_eq!(month, "2024-05");
    assert_eq!(notes, "checked");
    assert_eq!(po, None);
}

#[test]
fn legacy_billing_conflicts_with_parked_table() {
    let conn = conn();
    conn.execute_batch(LEGACY_BILLING).unwrap();
    conn.execute_batch("CREATE TABLE billing_records_old (id INTEGER)")
        .unwrap();

    let err = AddBillingRecords
        .apply(&StepContext::new(&conn))
        .unwrap_err();
    assert!(matches!(err, StoreError::LegacyConflict(_)));
}

#[test]
fn billing_records_gain_related_po() {
    let conn = conn();
    conn.execute_batch(
        "CREATE TABLE billing_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_id INTEGER NOT NULL,
            billing_month TEXT NOT NULL
        )",
    )
    .unwrap();

    AddBillingRecords.apply(&StepContext::new(&conn)).unwrap();

    let columns = list_columns(&conn, "billing_records").unwrap();
    assert_eq!(columns.last().map(String::as_str), Some("related_po"));
}

#[test]
fn billing_records_revert_drops_table() {
    let conn = conn();
    let ctx = StepContext::new(&conn);
    AddBillingRecords.apply(&ctx).unwrap();
    AddBillingRecords.revert(&ctx).unwrap();
    assert!(!table_exists(&conn, "billing_records").unwrap());
}

#[test]
fn physical_tables_created_when_absent() {
    let conn = conn();
    ConsolidatePhysicalPurchases
        .apply(&StepContext::new(&conn))
        .unwrap();

    assert_eq!(
        list_columns(&conn, "physical_purchases").unwrap(),
        PHYSICAL_PURCHASES.column_names()
    );
    assert!(table_exists(&conn, "purchase_trade_relations").unwrap());
}

#[test]
fn legacy_physical_rows_get_zero_premium() {
    let conn = conn();
    conn.execute_batch(LEGACY_PHYSICAL).unwrap();
    conn.execute(
        "INSERT INTO physical_purchases (purchase_date, supplier, product_name, quantity, \
         total_amount, po_number, created_at, updated_at) \
         VALUES ('2024-02-01', 'acme', '工碳', 20, 250000, 'PO-7', '2024-02-01', '2024-02-01')",
        [],
    )
    .unwrap();

    ConsolidatePhysicalPurchases
        .apply(&StepContext::new(&conn))
        .unwrap();

    assert_eq!(
        list_columns(&conn, "physical_purchases").unwrap(),
        PHYSICAL_PURCHASES.column_names()
    );
    assert!(!table_exists(&conn, "physical_purchases_new").unwrap());
    let (po, premium): (String, f64) = conn
        .query_row(
            "SELECT po_number, premium FROM physical_purchases",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(po, "PO-7");
    assert_eq!(premium, 0.0);
}

#[test]
fn empty_scratch_table_is_dropped() {
    let conn = conn();
    conn.execute_batch(&PHYSICAL_PURCHASES.create_if_absent_sql())
        .unwrap();
    conn.execute_batch(&PHYSICAL_PURCHASES.create_as_sql("physical_purchases_new"))
        .unwrap();

    ConsolidatePhysicalPurchases
        .apply(&StepContext::new(&conn))
        .unwrap();

    assert!(!table_exists(&conn, "physical_purchases_new").unwrap());
}

#[test]
fn non_empty_scratch_table_is_a_conflict() {
    let conn = conn();
    conn.execute_batch(&PHYSICAL_PURCHASES.create_if_absent_sql())
        .unwrap();
    conn.execute_batch(&PHYSICAL_PURCHASES.create_as_sql("physical_purchases_new"))
        .unwrap();
    conn.execute(
        "INSERT INTO physical_purchases_new (purchase_date, product_name, quantity, \
         total_amount, created_at, updated_at) \
         VALUES ('2024-02-01', '工碳', 1, 1, '2024-02-01', '2024-02-01')",
        [],
    )
    .unwrap();

    let err = ConsolidatePhysicalPurchases
        .apply(&StepContext::new(&conn))
        .unwrap_err();
    assert!(matches!(err, StoreError::LegacyConflict(_)));
}

#[test]
fn orphaned_scratch_table_is_recovered() {
    let conn = conn();
    conn.execute_batch(&PHYSICAL_PURCHASES.create_as_sql("physical_purchases_new"))
        .unwrap();
    conn.execute(
        "INSERT INTO physical_purchases_new (purchase_date, product_name, quantity, \
         total_amount, created_at, updated_at) \
         VALUES ('2024-02-01', '工碳', 1, 1, '2024-02-01', '2024-02-01')",
        [],
    )
    .unwrap();

    ConsolidatePhysicalPurchases
        .apply(&StepContext::new(&conn))
        .unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM physical_purchases", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert!(!table_exists(&conn, "physical_purchases_new").unwrap());
}

#[test]
fn physical_revert_drops_both_tables() {
    let conn = conn();
    let ctx = StepContext::new(&conn);
    ConsolidatePhysicalPurchases.apply(&ctx).unwrap();
    ConsolidatePhysicalPurchases.revert(&ctx).unwrap();
    assert!(!table_exists(&conn, "physical_purchases").unwrap());
    assert!(!table_exists(&conn, "purchase_trade_relations").unwrap());
}
