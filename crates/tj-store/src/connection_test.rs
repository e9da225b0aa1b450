//! Tests for JournalDb opening, pragmas, transactions and backups.

use crate::error::StoreError;
use crate::JournalDb;
use tj_core::DatabaseConfig;

fn count(db: &JournalDb, sql: &str) -> i64 {
    db.conn()
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .unwrap()
}

fn exec(db: &JournalDb, sql: &str) {
    db.conn().execute_batch(sql).unwrap();
}

#[test]
fn open_file_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");
    let db = JournalDb::open(&path, &DatabaseConfig::default()).unwrap();
    exec(&db, "CREATE TABLE t (x INTEGER)");
    assert!(path.exists());
    assert_eq!(db.path(), Some(path.as_path()));
}

#[test]
fn open_memory_has_no_path() {
    let db = JournalDb::open_memory().unwrap();
    assert!(db.path().is_none());
}

#[test]
fn session_pragmas_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        busy_timeout_ms: 1234,
        ..DatabaseConfig::default()
    };
    let db = JournalDb::open(&dir.path().join("journal.db"), &config).unwrap();

    assert_eq!(count(&db, "PRAGMA foreign_keys"), 0);
    assert_eq!(count(&db, "PRAGMA busy_timeout"), 1234);
    let mode: String = db
        .conn()
        .query_row("PRAGMA locking_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode, "exclusive");
}

#[test]
fn transaction_commits_on_success() {
    let db = JournalDb::open_memory().unwrap();
    exec(&db, "CREATE TABLE t (x INTEGER)");
    db.transaction(|conn| {
        conn.execute("INSERT INTO t VALUES (1)", [])?;
        Ok(())
    })
    .unwrap();
    assert_eq!(count(&db, "SELECT COUNT(*) FROM t"), 1);
}

#[test]
fn transaction_rolls_back_ddl_on_error() {
    let db = JournalDb::open_memory().unwrap();
    let result: Result<(), _> = db.transaction(|conn| {
        conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")?;
        Err(StoreError::QueryError("boom".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM sqlite_master WHERE name = 't'"),
        0
    );
}

#[test]
fn backup_writes_a_readable_copy() {
    let dir = tempfile::tempdir().unwrap();
    let db = JournalDb::open(&dir.path().join("journal.db"), &DatabaseConfig::default()).unwrap();
    exec(&db, "CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);");

    let dest = dir.path().join("it's a copy.db");
    db.backup_to(&dest).unwrap();

    let copy = JournalDb::open(&dest, &DatabaseConfig::default()).unwrap();
    assert_eq!(count(&copy, "SELECT x FROM t"), 7);
}

#[test]
fn backup_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("taken.db");
    std::fs::write(&dest, b"occupied").unwrap();

    let db = JournalDb::open_memory().unwrap();
    let err = db.backup_to(&dest).unwrap_err();
    assert!(matches!(err, StoreError::SyncError(_)));
    assert_eq!(std::fs::read(&dest).unwrap(), b"occupied");
}
