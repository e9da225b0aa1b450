use super::{
    create_parent_dir, meta_path_for, now_string, sql_to_json, write_json, DatabaseMeta,
    Snapshot, TableDump, SNAPSHOT_FORMAT_VERSION,
};
use crate::connection::JournalDb;
use crate::error::{StoreError, StoreResult};
use crate::introspect::{list_columns, list_tables, quote_ident, table_row_count};
use crate::ledger;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Map;
use std::path::{Path, PathBuf};

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Sidecar file, for database exports.
    pub meta_path: Option<PathBuf>,
    pub schema_version: u32,
    pub tables: usize,
    pub rows: usize,
}

/// Write every user table, the ledger included, to a JSON snapshot.
pub fn export_json(db: &JournalDb, path: &Path) -> StoreResult<ExportReport> {
    let conn = db.conn();
    let schema_version = ledger::current_version(conn)?;

    let mut tables = std::collections::BTreeMap::new();
    let mut rows = 0;
    for table in list_tables(conn)? {
        let dump = dump_table(conn, &table)?;
        log::info!("Exported table {table}: {} rows", dump.rows.len());
        rows += dump.rows.len();
        tables.insert(table, dump);
    }

    let snapshot = Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        schema_version,
        export_date: now_string(),
        tables,
    };
    create_parent_dir(path)?;
    write_json(path, &snapshot)?;
    log::info!("Exported schema v{schema_version:03} snapshot to {}", path.display());

    Ok(ExportReport {
        path: path.to_path_buf(),
        meta_path: None,
        schema_version,
        tables: snapshot.tables.len(),
        rows,
    })
}

/// Copy the database file to `path` and write its `_meta.json` sidecar.
pub fn export_database(db: &JournalDb, path: &Path) -> StoreResult<ExportReport> {
    let conn = db.conn();
    let schema_version = ledger::current_version(conn)?;

    create_parent_dir(path)?;
    db.backup_to(path)?;

    let meta = DatabaseMeta {
        schema_version,
        export_date: now_string(),
        original_db_path: db
            .path()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string()),
    };
    let meta_path = meta_path_for(path);
    write_json(&meta_path, &meta)?;
    log::info!(
        "Exported database to {} with metadata {}",
        path.display(),
        meta_path.display()
    );

    let tables = list_tables(conn)?;
    let mut rows = 0;
    for table in &tables {
        rows += usize::try_from(table_row_count(conn, table)?).unwrap_or_default();
    }
    Ok(ExportReport {
        path: path.to_path_buf(),
        meta_path: Some(meta_path),
        schema_version,
        tables: tables.len(),
        rows,
    })
}

fn dump_table(conn: &Connection, table: &str) -> StoreResult<TableDump> {
    let columns = list_columns(conn, table)?;
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(table)))
        .map_err(|e| StoreError::SyncError(format!("failed to read {table}: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            let mut map = Map::new();
            for (i, column) in columns.iter().enumerate() {
                map.insert(column.clone(), sql_to_json(row.get_ref(i)?));
            }
            Ok(map)
        })
        .map_err(|e| StoreError::SyncError(format!("failed to read {table}: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::SyncError(format!("failed to read row of {table}: {e}")))?;

    Ok(TableDump { columns, rows })
}
