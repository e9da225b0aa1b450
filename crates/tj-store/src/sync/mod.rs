//! Snapshots of the journal stamped with the schema version they came from.
//!
//! Two formats: a JSON document holding every user table, and a plain copy of
//! the database file with a `<stem>_meta.json` sidecar. Imports of older
//! snapshots finish by migrating the store to the latest version.

mod export;
mod import;

pub use export::{export_database, export_json, ExportReport};
pub use import::{import_database, import_json, DatabaseImportReport, ImportMode, ImportReport};

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Version of the JSON snapshot layout this build reads and writes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// JSON export of the whole journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "version")]
    pub format_version: u32,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub export_date: String,
    #[serde(default)]
    pub tables: BTreeMap<String, TableDump>,
}

/// One table's columns and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDump {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

/// Sidecar written next to a database file export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub export_date: String,
    #[serde(default)]
    pub original_db_path: String,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Db,
    Json,
}

/// `<dir>/trading_journal_db_<ts>.db` or `<dir>/trading_journal_backup_<ts>.json`.
pub fn default_export_path(dir: &Path, format: ExportFormat, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match format {
        ExportFormat::Db => dir.join(format!("trading_journal_db_{stamp}.db")),
        ExportFormat::Json => dir.join(format!("trading_journal_backup_{stamp}.json")),
    }
}

/// `foo.db` → `foo_meta.json`, in the same directory.
pub fn meta_path_for(db_file: &Path) -> PathBuf {
    let stem = db_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    db_file.with_file_name(format!("{stem}_meta.json"))
}

/// Copy `db_path` into `backups_dir` as `backup_before_import_<ts>.db`.
pub fn backup_file(db_path: &Path, backups_dir: &Path) -> StoreResult<PathBuf> {
    create_dir(backups_dir)?;
    let dest = backup_path(backups_dir, Utc::now());
    std::fs::copy(db_path, &dest).map_err(|source| StoreError::Io {
        path: db_path.display().to_string(),
        source,
    })?;
    log::info!("Backed up {} to {}", db_path.display(), dest.display());
    Ok(dest)
}

fn backup_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "backup_before_import_{}.db",
        now.format("%Y%m%d_%H%M%S_%6f")
    ))
}

pub(crate) fn now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn create_dir(dir: &Path) -> StoreResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.display().to_string(),
        source,
    })
}

pub(crate) fn create_parent_dir(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir(parent),
        _ => Ok(()),
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::SyncError(format!("failed to serialize {}: {e}", path.display())))?;
    std::fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> StoreResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text)
        .map_err(|e| StoreError::SyncError(format!("invalid JSON in {}: {e}", path.display())))
}

/// SQLite value → JSON. Blobs become arrays of byte values.
pub(crate) fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|&b| Value::from(b)).collect()),
    }
}

/// JSON → SQLite value. Arrays of bytes go back to blobs; other nested
/// values are stored as JSON text.
pub(crate) fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(items) => match as_bytes(items) {
            Some(bytes) => SqlValue::Blob(bytes),
            None => SqlValue::Text(value.to_string()),
        },
        Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn as_bytes(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
