//! Schema introspection helpers.
//!
//! Every step's `up`/`down` queries the live schema through these functions
//! instead of assuming a shape.

use crate::error::{StoreError, StoreResult};
use rusqlite::{params, Connection};

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Return `true` if a table named `table` exists.
pub fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )
    .map_err(|e| StoreError::QueryError(format!("failed to check table {table}: {e}")))
}

/// Column names of `table` in declaration order; empty if the table is absent.
pub fn list_columns(conn: &Connection, table: &str) -> StoreResult<Vec<String>> {
    Ok(table_info(conn, table)?
        .into_iter()
        .map(|c| c.name)
        .collect())
}

/// Full column metadata of `table` in declaration order; empty if absent.
pub fn table_info(conn: &Connection, table: &str) -> StoreResult<Vec<ColumnInfo>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?1) ORDER BY cid",
        )
        .map_err(|e| StoreError::QueryError(format!("failed to prepare table_info: {e}")))?;

    let rows = stmt
        .query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                decl_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default_value: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? != 0,
            })
        })
        .map_err(|e| StoreError::QueryError(format!("failed to read table_info({table}): {e}")))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::QueryError(format!("table_info row error: {e}")))
}

/// List all user tables (excluding SQLite internals), sorted by name.
pub fn list_tables(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .map_err(|e| StoreError::QueryError(format!("failed to prepare table list: {e}")))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| StoreError::QueryError(format!("failed to list tables: {e}")))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::QueryError(format!("table list row error: {e}")))
}

/// Count the rows in `table`.
pub fn table_row_count(conn: &Connection, table: &str) -> StoreResult<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )
    .map_err(|e| StoreError::QueryError(format!("failed to count rows in {table}: {e}")))
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE widgets (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                weight REAL DEFAULT 0
            );
            INSERT INTO widgets (name) VALUES ('a'), ('b');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn detects_existing_and_missing_tables() {
        let conn = conn();
        assert!(table_exists(&conn, "widgets").unwrap());
        assert!(!table_exists(&conn, "gadgets").unwrap());
    }

    #[test]
    fn lists_columns_in_declaration_order() {
        let conn = conn();
        assert_eq!(list_columns(&conn, "widgets").unwrap(), ["id", "name", "weight"]);
        assert!(list_columns(&conn, "gadgets").unwrap().is_empty());
    }

    #[test]
    fn table_info_reports_constraints() {
        let conn = conn();
        let info = table_info(&conn, "widgets").unwrap();
        assert!(info[0].primary_key);
        assert!(info[1].not_null);
        assert_eq!(info[2].default_value.as_deref(), Some("0"));
        assert_eq!(info[2].decl_type, "REAL");
    }

    #[test]
    fn counts_rows_and_lists_tables() {
        let conn = conn();
        assert_eq!(table_row_count(&conn, "widgets").unwrap(), 2);
        assert_eq!(list_tables(&conn).unwrap(), ["widgets"]);
    }

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
