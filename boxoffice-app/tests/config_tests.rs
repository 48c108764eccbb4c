use boxoffice_app::{AppConfig, AppError};
use boxoffice_storage::BackendKind;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn defaults() {
    let config = AppConfig::default();
    assert_eq!(config.primary, BackendKind::Relational);
    assert!(config.initial_sync);
    assert!(!config.bidirectional);
    assert_eq!(config.database_path(), PathBuf::from("data/boxoffice.db"));
    assert_eq!(config.flat_file_path(), PathBuf::from("data/csv"));
    assert!(config.validate().is_ok());
}

#[test]
fn partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boxoffice.json");
    fs::write(&path, r#"{ "primary": "flat_file", "bidirectional": true }"#).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(
        config,
        AppConfig {
            primary: BackendKind::FlatFile,
            bidirectional: true,
            ..AppConfig::default()
        }
    );
}

#[test]
fn rejects_memory_primary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boxoffice.json");
    fs::write(&path, r#"{ "primary": "memory" }"#).unwrap();
    assert!(matches!(AppConfig::load(&path).unwrap_err(), AppError::Config(_)));
}

#[test]
fn rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boxoffice.json");
    fs::write(&path, "{ primary: ").unwrap();
    assert!(matches!(AppConfig::load(&path).unwrap_err(), AppError::Json(_)));
}

#[test]
fn missing_file_is_io_error() {
    let err = AppConfig::load(&PathBuf::from("/nonexistent/boxoffice.json")).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn round_trips_through_json() {
    let config = AppConfig {
        data_dir: PathBuf::from("/var/lib/boxoffice"),
        initial_sync: false,
        ..AppConfig::default()
    };
    let text = serde_json::to_string(&config).unwrap();
    assert!(text.contains("\"primary\":\"relational\""));
    let back: AppConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}
