//! Integration tests for logging functionality

use crd::config::{parse_config, LoggingConfig};
use crd::logging::{init_logging, parse_log_level};
use tempfile::TempDir;
use tracing::Level;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "/var/log/crd");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_logging_section_validation() {
    assert!(parse_config("[logging]\nlocal_rotation = \"never\"\n").is_ok());
    assert!(parse_config("[logging]\nlocal_rotation = \"monthly\"\n").is_err());
    assert!(parse_config("[logging]\nlocal_enabled = true\nlocal_path = \"\"\n").is_err());
}

#[test]
fn test_parse_log_level_case_insensitive() {
    assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("Debug").unwrap(), Level::DEBUG);
    assert!(parse_log_level("chatty").is_err());
}

#[test]
fn test_init_logging_rejects_invalid_level() {
    let config = LoggingConfig::default();
    assert!(init_logging("chatty", &config).is_err());
}

// The global subscriber can only be installed once per test binary
#[test]
fn test_file_logging_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    assert!(!log_path.exists());

    let guard = init_logging("info", &config).unwrap();
    tracing::info!(hook = "order-sign", "written to the file layer");
    drop(guard);

    assert!(log_path.exists());
}
