//! Append-only record of applied schema versions.
//!
//! The ledger lives in `schema_version`, the same layout earlier journal
//! releases wrote, so databases created by them are read as-is. A missing
//! table means version 0.

use crate::error::{StoreError, StoreResult};
use crate::introspect::table_exists;
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::time::Duration;

/// Ledger table name.
pub const LEDGER_TABLE: &str = "schema_version";

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub version: u32,
    pub description: String,
    /// `None` when an older release left it empty or unreadable.
    pub applied_at: Option<DateTime<Utc>>,
    /// Wall time spent inside the step, in seconds.
    pub execution_time: f64,
}

/// Create the ledger table if it does not exist.
pub fn ensure_exists(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version        INTEGER PRIMARY KEY,
             description    TEXT,
             applied_at     TEXT,
             execution_time REAL
         );",
    )
    .map_err(|e| StoreError::QueryError(format!("failed to create schema_version table: {e}")))
}

/// Return the highest applied version, or 0 if none (or no ledger).
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    if !table_exists(conn, LEDGER_TABLE)? {
        return Ok(0);
    }
    let version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::QueryError(format!("failed to read schema version: {e}")))?;
    u32::try_from(version)
        .map_err(|_| StoreError::QueryError(format!("schema version {version} is out of range")))
}

/// Append one row inside the caller's transaction.
///
/// A duplicate version surfaces as [`StoreError::ConstraintViolation`]: it
/// means a step is being applied twice.
pub fn record(
    conn: &Connection,
    version: u32,
    description: &str,
    applied_at: DateTime<Utc>,
    execution_time: Duration,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO schema_version (version, description, applied_at, execution_time) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            version,
            description,
            applied_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            execution_time.as_secs_f64()
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            StoreError::ConstraintViolation { version }
        }
        other => StoreError::QueryError(format!("failed to record v{version:03}: {other}")),
    })?;
    Ok(())
}

/// Delete the row for `version`. Used only by rollback.
pub fn forget(conn: &Connection, version: u32) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM schema_version WHERE version = ?1",
        params![version],
    )
    .map_err(|e| StoreError::QueryError(format!("failed to forget v{version:03}: {e}")))?;
    Ok(())
}

/// Applied version numbers, ascending. Empty when the ledger is absent.
pub fn applied_versions(conn: &Connection) -> StoreResult<Vec<u32>> {
    if !table_exists(conn, LEDGER_TABLE)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare("SELECT version FROM schema_version ORDER BY version")
        .map_err(|e| StoreError::QueryError(format!("failed to prepare ledger query: {e}")))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, u32>(0))
        .map_err(|e| StoreError::QueryError(format!("failed to query ledger: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::QueryError(format!("failed to read ledger row: {e}")))
}

/// `applied_at` of the highest version, if there is one and it parses.
pub fn latest_applied_at(conn: &Connection) -> StoreResult<Option<DateTime<Utc>>> {
    if !table_exists(conn, LEDGER_TABLE)? {
        return Ok(None);
    }
    let raw: Option<String> = conn
        .query_row(
            "SELECT applied_at FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::QueryError(format!("failed to read last applied_at: {e}")))?
        .flatten();
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// All applied versions, ascending. Empty when the ledger is absent.
pub fn history(conn: &Connection) -> StoreResult<Vec<LedgerEntry>> {
    if !table_exists(conn, LEDGER_TABLE)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare(
            "SELECT version, COALESCE(description, ''), applied_at, COALESCE(execution_time, 0) \
             FROM schema_version ORDER BY version",
        )
        .map_err(|e| StoreError::QueryError(format!("failed to prepare ledger query: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })
        .map_err(|e| StoreError::QueryError(format!("failed to query ledger: {e}")))?;

    let mut entries = Vec::new();
    for row in rows {
        let (version, description, applied_at, execution_time) =
            row.map_err(|e| StoreError::QueryError(format!("failed to read ledger row: {e}")))?;
        let parsed = applied_at.as_deref().and_then(parse_timestamp);
        if parsed.is_none() {
            log::warn!("v{version:03} has no readable applied_at ({applied_at:?})");
        }
        entries.push(LedgerEntry {
            version,
            description,
            applied_at: parsed,
            execution_time,
        });
    }
    Ok(entries)
}

/// Parse RFC 3339, or the naive forms written by older releases.
///
/// Older releases stamped rows with a naive ISO timestamp in the machine's
/// local time (`2024-03-01T09:30:15.123456`), read here as local time.
/// SQLite's `datetime('now')` form (`2024-03-01 09:30:15`) is UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
        return Some(local.unwrap_or_else(|| naive.and_utc()));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
