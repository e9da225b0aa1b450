use super::*;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.database.path, "data/trading_journal.db");
    assert_eq!(config.database.busy_timeout_ms, 5000);
    assert_eq!(config.exports_dir, "exports");
    assert_eq!(config.log_level, LogLevel::Warn);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
database:
  path: "./journal.db"
  busy_timeout_ms: 250
exports_dir: backups
log_level: debug
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.database.path, "./journal.db");
    assert_eq!(config.database.busy_timeout(), Duration::from_millis(250));
    assert_eq!(config.exports_dir, "backups");
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn test_log_level_accepts_python_style_names() {
    let config: Config = serde_yaml::from_str("log_level: warning").unwrap();
    assert_eq!(config.log_level, LogLevel::Warn);

    let config: Config = serde_yaml::from_str("log_level: critical").unwrap();
    assert_eq!(config.log_level.to_filter(), log::LevelFilter::Error);
}

#[test]
fn test_unknown_fields_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("secret_key: abc");
    assert!(result.is_err());
}

#[test]
fn test_in_memory_path() {
    let config: Config = serde_yaml::from_str("database:\n  path: \":memory:\"").unwrap();
    assert!(config.database.is_in_memory());
    assert!(config
        .database_path_absolute(Path::new("/tmp/journal"))
        .is_none());
}

#[test]
fn test_paths_resolve_against_root() {
    let config = Config::default();
    let root = PathBuf::from("/tmp/journal");
    assert_eq!(
        config.database_path_absolute(&root),
        Some(root.join("data/trading_journal.db"))
    );
    assert_eq!(config.exports_dir_absolute(&root), root.join("exports"));
}

#[test]
fn test_load_from_dir_without_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.database.path, "data/trading_journal.db");
}

#[test]
fn test_load_from_dir_reads_yaml_variant() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("journal.yaml"),
        "database:\n  path: custom.db\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.database.path, "custom.db");
}

#[test]
fn test_load_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_rejects_empty_database_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.yml");
    std::fs::write(&path, "database:\n  path: \"  \"\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_reports_parse_errors_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.yml");
    std::fs::write(&path, "database: [unclosed").unwrap();
    let err = Config::load(&path).unwrap_err();
    match err {
        CoreError::ConfigParseError { message } => assert!(message.contains("journal.yml")),
        other => panic!("unexpected error: {other}"),
    }
}
