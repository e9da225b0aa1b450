use super::{
    backup_file, backup_path, create_dir, create_parent_dir, json_to_sql, meta_path_for,
    read_json, DatabaseMeta, Snapshot, TableDump, SNAPSHOT_FORMAT_VERSION,
};
use crate::connection::JournalDb;
use crate::error::{StoreError, StoreResult};
use crate::introspect::{list_columns, list_tables, quote_ident, table_exists};
use crate::ledger;
use crate::runner::{MigrationOutcome, MigrationRunner};
use crate::step::{ColumnRename, MigrationRegistry};
use crate::steps::has_column;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tj_core::DatabaseConfig;

/// How snapshot rows meet existing rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Empty every table first; snapshot rows replace same-key rows.
    #[default]
    Replace,
    /// Keep existing rows; snapshot rows that conflict are ignored.
    Merge,
}

/// Summary of a JSON import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub snapshot_schema_version: u32,
    pub backup: Option<PathBuf>,
    pub tables_imported: Vec<String>,
    /// Snapshot tables this store does not have.
    pub tables_skipped: Vec<String>,
    pub rows_imported: usize,
    /// Rows that failed to insert or were ignored as duplicates.
    pub rows_skipped: usize,
    pub migration: Option<MigrationOutcome>,
}

/// Summary of a database file import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseImportReport {
    pub backup: Option<PathBuf>,
    /// Version the sidecar claimed, if there was one.
    pub meta_schema_version: Option<u32>,
    pub migration: MigrationOutcome,
}

/// Load a JSON snapshot into `db`, then migrate if the result is behind
/// the registry.
///
/// All rows load in one transaction. Columns renamed by steps the snapshot
/// predates are loaded under their new names. Rows that fail to insert are
/// logged and counted, not fatal. In [`ImportMode::Replace`] a file-backed store is first
/// copied into `backups_dir` when one is given.
pub fn import_json(
    db: &JournalDb,
    registry: &MigrationRegistry,
    path: &Path,
    mode: ImportMode,
    backups_dir: Option<&Path>,
) -> StoreResult<ImportReport> {
    let snapshot: Snapshot = read_json(path)?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(StoreError::SyncError(format!(
            "unsupported snapshot format version {} in {}",
            snapshot.format_version,
            path.display()
        )));
    }
    log::info!(
        "Importing {} (schema v{:03}, exported {})",
        path.display(),
        snapshot.schema_version,
        snapshot.export_date
    );

    let current = ledger::current_version(db.conn())?;
    if current > snapshot.schema_version {
        log::warn!(
            "Store is at v{current:03}, newer than the snapshot's v{:03}",
            snapshot.schema_version
        );
    }

    let mut report = ImportReport {
        snapshot_schema_version: snapshot.schema_version,
        ..ImportReport::default()
    };

    if mode == ImportMode::Replace {
        if let (Some(dir), Some(_)) = (backups_dir, db.path()) {
            create_dir(dir)?;
            let dest = backup_path(dir, Utc::now());
            db.backup_to(&dest)?;
            log::info!("Backed up current store to {}", dest.display());
            report.backup = Some(dest);
        }
    }

    let renames = registry.renames_after(snapshot.schema_version);
    db.transaction(|conn| {
        if mode == ImportMode::Replace {
            clear_tables(conn)?;
        }
        for (table, dump) in &snapshot.tables {
            if !table_exists(conn, table)? {
                log::warn!("Table {table} does not exist in this store, skipping");
                report.tables_skipped.push(table.clone());
                continue;
            }
            let (imported, skipped) = load_table(conn, table, dump, mode, &renames)?;
            report.rows_imported += imported;
            report.rows_skipped += skipped;
            report.tables_imported.push(table.clone());
        }
        Ok(())
    })?;

    let latest = registry.latest_version();
    let loaded = ledger::current_version(db.conn())?;
    if snapshot.schema_version < latest || loaded < latest {
        log::info!(
            "Migrating imported data from v{:03} to v{latest:03}",
            snapshot.schema_version.min(loaded)
        );
        report.migration = Some(MigrationRunner::new(db, registry).migrate(None)?);
    }

    Ok(report)
}

/// Replace the database file at `dst` with `src`, then migrate it.
///
/// The ledger inside the copied file decides which steps run; the sidecar's
/// version is only reported. If migration fails the previous file is
/// restored from the backup.
pub fn import_database(
    src: &Path,
    dst: &Path,
    config: &DatabaseConfig,
    registry: &MigrationRegistry,
    backups_dir: Option<&Path>,
) -> StoreResult<DatabaseImportReport> {
    if !src.is_file() {
        return Err(StoreError::SyncError(format!(
            "import file {} does not exist",
            src.display()
        )));
    }
    if dst.exists() && same_file(src, dst) {
        return Err(StoreError::SyncError(format!(
            "{} is the store itself",
            src.display()
        )));
    }

    let meta_path = meta_path_for(src);
    let meta: Option<DatabaseMeta> = if meta_path.is_file() {
        Some(read_json(&meta_path)?)
    } else {
        log::debug!("No metadata file at {}", meta_path.display());
        None
    };
    if let Some(meta) = &meta {
        log::info!(
            "Importing {} (schema v{:03}, exported {})",
            src.display(),
            meta.schema_version,
            meta.export_date
        );
    }

    let backup = match backups_dir {
        Some(dir) if dst.exists() => Some(backup_file(dst, dir)?),
        _ => None,
    };

    create_parent_dir(dst)?;
    std::fs::copy(src, dst).map_err(|source| StoreError::Io {
        path: dst.display().to_string(),
        source,
    })?;

    let meta_schema_version = meta.map(|m| m.schema_version);
    match migrate_copy(dst, config, registry, meta_schema_version) {
        Ok(migration) => Ok(DatabaseImportReport {
            backup,
            meta_schema_version,
            migration,
        }),
        Err(e) => {
            if let Some(backup) = &backup {
                log::warn!("Import failed, restoring {} from {}", dst.display(), backup.display());
                if let Err(restore_err) = std::fs::copy(backup, dst) {
                    log::error!("Failed to restore {}: {restore_err}", dst.display());
                }
            }
            Err(e)
        }
    }
}

fn migrate_copy(
    dst: &Path,
    config: &DatabaseConfig,
    registry: &MigrationRegistry,
    meta_schema_version: Option<u32>,
) -> StoreResult<MigrationOutcome> {
    let db = JournalDb::open(dst, config)?;
    let recorded = ledger::current_version(db.conn())?;
    if let Some(claimed) = meta_schema_version {
        if claimed != recorded {
            log::warn!(
                "Metadata says v{claimed:03} but the imported ledger is at v{recorded:03}; trusting the ledger"
            );
        }
    }
    MigrationRunner::new(&db, registry).migrate(None)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn clear_tables(conn: &Connection) -> StoreResult<()> {
    for table in list_tables(conn)? {
        conn.execute_batch(&format!("DELETE FROM {}", quote_ident(&table)))
            .map_err(|e| StoreError::SyncError(format!("failed to clear {table}: {e}")))?;
    }
    log::info!("Cleared existing rows");
    Ok(())
}

/// Insert `dump` into `table` by column name. Returns (imported, skipped).
fn load_table(
    conn: &Connection,
    table: &str,
    dump: &TableDump,
    mode: ImportMode,
    renames: &[ColumnRename],
) -> StoreResult<(usize, usize)> {
    let target = list_columns(conn, table)?;
    let source = source_columns(dump);

    // (snapshot key, store column)
    let mut columns: Vec<(&str, &str)> = Vec::new();
    let mut unknown: Vec<&str> = Vec::new();
    for name in source.iter().map(String::as_str) {
        if has_column(&target, name) {
            columns.push((name, name));
            continue;
        }
        let renamed = renames.iter().find(|r| {
            r.table.eq_ignore_ascii_case(table)
                && r.from.eq_ignore_ascii_case(name)
                && has_column(&target, r.to)
                && !has_column(&source, r.to)
        });
        match renamed {
            Some(rename) => {
                log::info!("Loading {table}.{name} into {}", rename.to);
                columns.push((name, rename.to));
            }
            None => unknown.push(name),
        }
    }
    if !unknown.is_empty() {
        log::warn!("Ignoring columns of {table} this store does not have: {unknown:?}");
    }
    if columns.is_empty() {
        return Ok((0, dump.rows.len()));
    }

    let verb = match mode {
        ImportMode::Replace => "INSERT OR REPLACE",
        ImportMode::Merge => "INSERT OR IGNORE",
    };
    let column_list: Vec<String> = columns.iter().map(|(_, c)| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "{verb} INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::SyncError(format!("failed to prepare insert into {table}: {e}")))?;

    let mut imported = 0;
    let mut skipped = 0;
    for row in &dump.rows {
        let values: Vec<SqlValue> = columns
            .iter()
            .map(|(key, _)| row.get(*key).map_or(SqlValue::Null, json_to_sql))
            .collect();
        match stmt.execute(params_from_iter(values)) {
            Ok(0) => skipped += 1,
            Ok(_) => imported += 1,
            Err(e) => {
                log::warn!("Skipping row of {table}: {e}");
                skipped += 1;
            }
        }
    }
    log::info!("Imported table {table}: {imported} rows, {skipped} skipped");
    Ok((imported, skipped))
}

/// Declared columns, or the row keys in first-seen order when the dump
/// carries no column list.
fn source_columns(dump: &TableDump) -> Vec<String> {
    if !dump.columns.is_empty() {
        return dump.columns.clone();
    }
    let mut columns: Vec<String> = Vec::new();
    for row in &dump.rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}
