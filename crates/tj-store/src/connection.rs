//! Journal database connection wrapper.
//!
//! [`JournalDb`] owns the single SQLite [`Connection`] used during the
//! migration phase and provides helpers for opening and transacting against
//! the journal file.

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tj_core::DatabaseConfig;

/// Session settings for the migration connection.
///
/// `locking_mode=EXCLUSIVE` keeps the file lock from the first read until the
/// connection is dropped, so no other process can interleave with DDL.
/// Foreign keys stay off so that table rebuilds never trigger cascades.
const SESSION_PRAGMAS: &str = "PRAGMA foreign_keys=OFF; PRAGMA locking_mode=EXCLUSIVE;";

/// Wrapper around the SQLite connection to the journal file.
///
/// Single-threaded, no `Mutex` needed because migration runs once at startup
/// before any request is served.
pub struct JournalDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl JournalDb {
    /// Open (or create) the journal database at `path`.
    ///
    /// Does not migrate: callers decide between [`crate::initialize`],
    /// [`crate::MigrationRunner::status`] and friends.
    pub fn open(path: &Path, config: &DatabaseConfig) -> StoreResult<Self> {
        log::debug!("Opening journal database at {}", path.display());
        let conn = Connection::open(path)
            .map_err(|e| StoreError::ConnectionError(format!("{e}: {}", path.display())))?;
        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| StoreError::ConnectionError(format!("failed to set busy timeout: {e}")))?;
        conn.execute_batch(SESSION_PRAGMAS)
            .map_err(|e| StoreError::ConnectionError(format!("failed to set pragmas: {e}")))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an empty in-memory journal database.
    ///
    /// Useful for unit tests that don't need persistence.
    pub fn open_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        conn.execute_batch(SESSION_PRAGMAS)
            .map_err(|e| StoreError::ConnectionError(format!("failed to set pragmas: {e}")))?;
        Ok(Self { conn, path: None })
    }

    /// Borrow the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute `body` within a `BEGIN IMMEDIATE` / `COMMIT` transaction,
    /// rolling back on error.
    ///
    /// SQLite DDL is transactional, so a rename/create/copy/drop sequence
    /// inside `body` either lands completely or not at all.
    pub fn transaction<F, T>(&self, body: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StoreError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(StoreError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    log::error!("ROLLBACK failed: {rollback_err}");
                }
            }
        }
        result
    }

    /// Write a consistent copy of the whole database to `dest` with
    /// `VACUUM INTO`. `dest` must not exist yet.
    pub fn backup_to(&self, dest: &Path) -> StoreResult<()> {
        if dest.exists() {
            return Err(StoreError::SyncError(format!(
                "refusing to overwrite existing file {}",
                dest.display()
            )));
        }
        let target = dest.to_string_lossy().replace('\'', "''");
        self.conn
            .execute_batch(&format!("VACUUM INTO '{target}'"))
            .map_err(|e| StoreError::QueryError(format!("VACUUM INTO {}: {e}", dest.display())))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
