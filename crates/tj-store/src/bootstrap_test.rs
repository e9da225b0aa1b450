//! Tests for bootstrap and schema verification.

use super::*;

#[test]
fn creates_base_tables_and_seeds_products() {
    let db = JournalDb::open_memory().unwrap();
    let report = BootstrapInitializer::new(&db).run().unwrap();

    assert_eq!(
        report.created_tables,
        ["trades", "smm_prices", "futures_prices", "products"]
    );
    assert_eq!(report.seeded_products, 2);

    let names: Vec<String> = db
        .conn()
        .prepare("SELECT name FROM products ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, ["工碳", "电碳"]);
}

#[test]
fn second_run_changes_nothing() {
    let db = JournalDb::open_memory().unwrap();
    let init = BootstrapInitializer::new(&db);
    init.run().unwrap();

    assert_eq!(init.run().unwrap(), BootstrapReport::default());
    assert_eq!(table_row_count(db.conn(), "products").unwrap(), 2);
}

#[test]
fn does_not_seed_a_populated_products_table() {
    let db = JournalDb::open_memory().unwrap();
    db.conn()
        .execute_batch(&PRODUCTS.create_if_absent_sql())
        .unwrap();
    db.conn()
        .execute("INSERT INTO products (name) VALUES ('自定义')", [])
        .unwrap();

    let report = BootstrapInitializer::new(&db).run().unwrap();
    assert_eq!(report.seeded_products, 0);
    assert_eq!(table_row_count(db.conn(), "products").unwrap(), 1);
}

#[test]
fn leaves_existing_tables_untouched() {
    let db = JournalDb::open_memory().unwrap();
    db.conn()
        .execute_batch("CREATE TABLE smm_prices (id INTEGER PRIMARY KEY, odd TEXT)")
        .unwrap();

    BootstrapInitializer::new(&db).run().unwrap();
    assert_eq!(list_columns(db.conn(), "smm_prices").unwrap(), ["id", "odd"]);
}

#[test]
fn verify_accepts_a_bootstrapped_store() {
    let db = JournalDb::open_memory().unwrap();
    let init = BootstrapInitializer::new(&db);
    init.run().unwrap();
    init.verify().unwrap();
}

#[test]
fn verify_reports_missing_and_unexpected_columns() {
    let db = JournalDb::open_memory().unwrap();
    db.conn()
        .execute_batch(
            "CREATE TABLE futures_prices (
                id INTEGER PRIMARY KEY,
                price_date TEXT,
                highest_price REAL,
                lowest_price REAL,
                average_price REAL,
                created_at TEXT,
                source TEXT
            )",
        )
        .unwrap();

    let err = verify_schema(db.conn()).unwrap_err();
    match err {
        StoreError::SchemaDrift {
            table,
            missing,
            unexpected,
        } => {
            assert_eq!(table, "futures_prices");
            assert_eq!(missing, ["updated_at"]);
            assert_eq!(unexpected, ["source"]);
        }
        other => panic!("expected SchemaDrift, got {other:?}"),
    }
}
