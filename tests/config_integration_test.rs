//! Integration tests for configuration loading

use crd::config::{load_config, parse_config, Environment};
use crd::domain::FhirVersion;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Environment variables are process-wide; serialize the tests that touch them
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "CRD_APPLICATION_LOG_LEVEL",
        "CRD_APPLICATION_BASE_URL",
        "CRD_FHIR_SERVER_URL",
        "CRD_FHIR_ACCESS_TOKEN",
        "CRD_FHIR_TIMEOUT_SECONDS",
        "CRD_FHIR_TLS_VERIFY",
        "CRD_BACKFILL_ENABLED",
        "CRD_RULES_INDEX_PATH",
        "CRD_RULES_FHIR_VERSION",
        "CRD_LOGGING_LOCAL_ENABLED",
        "CRD_LOGGING_LOCAL_PATH",
        "CRD_TEST_EHR_TOKEN",
        "CRD_TEST_MISSING_VAR",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "staging"

[application]
log_level = "debug"
base_url = "https://crd.example.com/"

[fhir]
server_url = "https://ehr.example.com/fhir/r4"
access_token = "static-token"
timeout_seconds = 15
tls_verify = true

[backfill]
enabled = false

[rules]
index_path = "/etc/crd/rules/index.toml"

[logging]
local_enabled = true
local_path = "/tmp/crd-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.environment, Environment::Staging);
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.application.base_url, "https://crd.example.com/");
    assert_eq!(
        config.fhir.server_url.as_deref(),
        Some("https://ehr.example.com/fhir/r4")
    );
    assert!(config
        .fhir
        .access_token
        .as_ref()
        .is_some_and(|t| t.expose_secret() == "static-token"));
    assert_eq!(config.fhir.timeout_seconds, 15);
    assert!(!config.backfill.enabled);
    assert_eq!(config.rules.index_path, "/etc/crd/rules/index.toml");
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let config = parse_config("").unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.application.log_level, "info");
    assert!(config.fhir.server_url.is_none());
    assert!(config.fhir.access_token.is_none());
    assert!(config.fhir.tls_verify);
    assert!(config.backfill.enabled);
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_missing_config_file() {
    let result = load_config("/nonexistent/crd.toml");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Configuration file not found"));
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CRD_TEST_EHR_TOKEN", "substituted-token");

    let config = parse_config(
        r#"
[fhir]
server_url = "https://ehr.example.com/fhir"
access_token = "${CRD_TEST_EHR_TOKEN}"
"#,
    )
    .unwrap();

    assert!(config
        .fhir
        .access_token
        .as_ref()
        .is_some_and(|t| t.expose_secret() == "substituted-token"));

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let result = parse_config(
        r#"
[fhir]
access_token = "${CRD_TEST_MISSING_VAR}"
"#,
    );

    let message = result.unwrap_err().to_string();
    assert!(message.contains("CRD_TEST_MISSING_VAR"));
}

#[test]
fn test_placeholders_in_comments_are_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let config = parse_config(
        r#"
[fhir]
# access_token = "${CRD_TEST_MISSING_VAR}"
timeout_seconds = 5
"#,
    )
    .unwrap();

    assert_eq!(config.fhir.timeout_seconds, 5);
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CRD_FHIR_SERVER_URL", "https://override.example.com/fhir");
    std::env::set_var("CRD_FHIR_TIMEOUT_SECONDS", "7");
    std::env::set_var("CRD_BACKFILL_ENABLED", "false");
    std::env::set_var("CRD_RULES_INDEX_PATH", "/srv/rules.toml");
    std::env::set_var("CRD_RULES_FHIR_VERSION", "stu3");

    let config = parse_config(
        r#"
[fhir]
server_url = "https://ehr.example.com/fhir"
timeout_seconds = 30

[backfill]
enabled = true
"#,
    )
    .unwrap();

    assert_eq!(
        config.fhir.server_url.as_deref(),
        Some("https://override.example.com/fhir")
    );
    assert_eq!(config.fhir.timeout_seconds, 7);
    assert!(!config.backfill.enabled);
    assert_eq!(config.rules.index_path, "/srv/rules.toml");
    assert_eq!(config.rules.fhir_version, FhirVersion::Stu3);

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for contents in [
        "[application]\nlog_level = \"verbose\"\n",
        "[fhir]\nserver_url = \"ftp://ehr.example.com\"\n",
        "[fhir]\ntimeout_seconds = 0\n",
        "[rules]\nindex_path = \"  \"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let result = parse_config(contents);
        assert!(result.is_err(), "expected rejection for {contents:?}");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Configuration validation failed"));
    }
}

#[test]
fn test_production_rejects_disabled_tls_verification() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let production = parse_config(
        r#"
environment = "production"

[fhir]
tls_verify = false
"#,
    );
    assert!(production.unwrap_err().to_string().contains("TLS"));

    let development = parse_config(
        r#"
environment = "development"

[fhir]
tls_verify = false
"#,
    )
    .unwrap();
    assert!(!development.fhir.tls_verify);
}

#[test]
fn test_access_token_is_redacted_in_debug_output() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let config = parse_config("[fhir]\naccess_token = \"do-not-print\"\n").unwrap();
    let debug = format!("{:?}", config.fhir);

    assert!(!debug.contains("do-not-print"));
}
