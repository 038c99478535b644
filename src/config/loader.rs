//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CrdConfig;
use crate::domain::errors::CrdError;
use crate::domain::result::Result;
use regex::Regex;
use secrecy::SecretString;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CrdConfig
/// 4. Applies environment variable overrides (CRD_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use crd::config::loader::load_config;
///
/// let config = load_config("crd.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CrdConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CrdError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CrdError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn parse_config(contents: &str) -> Result<CrdConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: CrdConfig = toml::from_str(&contents)
        .map_err(|e| CrdError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CrdError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid placeholder pattern"))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_pattern();
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(CrdError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using CRD_* prefix
///
/// Environment variables follow the pattern: CRD_<SECTION>_<KEY>
/// For example: CRD_FHIR_SERVER_URL, CRD_BACKFILL_ENABLED
fn apply_env_overrides(config: &mut CrdConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CRD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CRD_APPLICATION_BASE_URL") {
        config.application.base_url = val;
    }

    // FHIR overrides
    if let Ok(val) = std::env::var("CRD_FHIR_SERVER_URL") {
        config.fhir.server_url = Some(val);
    }
    if let Ok(val) = std::env::var("CRD_FHIR_ACCESS_TOKEN") {
        config.fhir.access_token = Some(SecretString::new(val));
    }
    if let Ok(val) = std::env::var("CRD_FHIR_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.fhir.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("CRD_FHIR_TLS_VERIFY") {
        config.fhir.tls_verify = val.parse().unwrap_or(true);
    }

    // Backfill overrides
    if let Ok(val) = std::env::var("CRD_BACKFILL_ENABLED") {
        config.backfill.enabled = val.parse().unwrap_or(true);
    }

    // Rules overrides
    if let Ok(val) = std::env::var("CRD_RULES_INDEX_PATH") {
        config.rules.index_path = val;
    }
    if let Ok(val) = std::env::var("CRD_RULES_FHIR_VERSION") {
        if let Ok(version) = val.parse() {
            config.rules.fhir_version = version;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CRD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CRD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
