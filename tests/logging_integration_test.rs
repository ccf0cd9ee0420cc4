//! Integration tests for logging functionality

use iot_exporter::config::{parse_config, LoggingConfig};
use iot_exporter::logging::init_logging;
use iot_exporter::logging::structured::LOG_FILE_NAME;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_rotation_is_rejected() {
    let err = parse_config(
        r#"
[iot]
client_id = "client"
client_secret = "secret"

[destination]
bucket = "/srv/bucket"

[logging]
local_rotation = "size"
"#,
    )
    .unwrap_err();

    assert!(err.to_string().contains("local_rotation"), "{err}");
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let result = init_logging("verbose", &LoggingConfig::default());
    assert!(result.is_err());
}

#[test]
fn test_file_logging_writes_json() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "daily".to_string(),
    };

    let guard = init_logging("info", &config).expect("Failed to initialize logging");
    tracing::info!(target: "iot_exporter::marker", thing_id = "91f30213", "Extraction marker");

    // A second global subscriber cannot be installed
    assert!(init_logging("info", &LoggingConfig::default()).is_err());
    drop(guard);

    let log_file = std::fs::read_dir(&log_path)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_NAME))
        })
        .expect("log file not created");

    let content = std::fs::read_to_string(log_file).unwrap();
    let line = content
        .lines()
        .find(|line| line.contains("Extraction marker"))
        .expect("marker not logged");
    let entry: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(entry["fields"]["thing_id"], "91f30213");
    assert_eq!(entry["level"], "INFO");
}
