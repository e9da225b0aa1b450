use super::*;
use std::fs;
use tempfile::tempdir;

fn global(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.display().to_string(),
        config: None,
        database: None,
    }
}

fn args(path: &Path, merge: bool) -> ImportArgs {
    ImportArgs {
        path: path.display().to_string(),
        merge,
        no_backup: true,
    }
}

#[test]
fn database_files_are_recognised_by_extension() {
    assert!(is_database_file(Path::new("exports/trading_journal_db_1.db")));
    assert!(is_database_file(Path::new("COPY.DB")));
    assert!(!is_database_file(Path::new("backup.json")));
    assert!(!is_database_file(Path::new("db")));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = execute(&args(&dir.path().join("nope.json"), false), &global(dir.path()))
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn merge_is_rejected_for_database_files() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("copy.db");
    fs::write(&source, b"").unwrap();

    let err = execute(&args(&source, true), &global(dir.path())).unwrap_err();
    assert!(err.to_string().contains("--merge"));
}

#[test]
fn json_snapshot_is_loaded_into_a_new_store() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{
            "version": 1,
            "schema_version": 3,
            "tables": {
                "smm_prices": {
                    "columns": ["price_date", "highest_price", "lowest_price", "average_price"],
                    "rows": [{"price_date": "2024-03-01", "highest_price": 10, "lowest_price": 8, "average_price": 9}]
                }
            }
        }"#,
    )
    .unwrap();

    execute(&args(&snapshot, true), &global(dir.path())).unwrap();

    let db = tj_store::JournalDb::open(
        &dir.path().join("data/trading_journal.db"),
        &tj_core::DatabaseConfig::default(),
    )
    .unwrap();
    let rows: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM smm_prices", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}
