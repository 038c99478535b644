//! Configuration schema types
//!
//! This module defines the configuration structure for CRD.

use crate::config::SecretString;
use crate::domain::FhirVersion;
use serde::{Deserialize, Serialize};

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main CRD configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrdConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// FHIR server access used by prefetch backfill
    #[serde(default)]
    pub fhir: FhirConfig,

    /// Prefetch backfill settings
    #[serde(default)]
    pub backfill: BackfillConfig,

    /// Rule index location
    #[serde(default)]
    pub rules: RulesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CrdConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.fhir.validate(&self.environment)?;
        self.rules.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL of this service, handed to the rule engine
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| format!("application.base_url '{}' is not a valid URL: {e}", self.base_url))?;
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            base_url: default_base_url(),
        }
    }
}

/// FHIR server configuration
///
/// The request's own `fhirServer` and `fhirAuthorization` take precedence;
/// `server_url` and `access_token` are fallbacks for EHRs that omit them.
#[derive(Debug, Clone, Deserialize)]
pub struct FhirConfig {
    /// Fallback FHIR base URL
    #[serde(default)]
    pub server_url: Option<String>,

    /// Fallback bearer token
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Transport timeout for the backfill batch request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    ///
    /// Disabling verification is rejected in production environments.
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl FhirConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if let Some(server_url) = &self.server_url {
            if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
                return Err("fhir.server_url must start with http:// or https://".to_string());
            }
            url::Url::parse(server_url)
                .map_err(|e| format!("fhir.server_url '{server_url}' is not a valid URL: {e}"))?;
        }

        if self.timeout_seconds == 0 {
            return Err("fhir.timeout_seconds must be > 0".to_string());
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments. \
                Set 'tls_verify = true', or use 'environment = \"development\"' for local testing."
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for FhirConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            access_token: None,
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
        }
    }
}

/// Prefetch backfill configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// Fetch referenced records missing from the prefetch before processing
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Rule index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Path of the TOML rule index
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// FHIR release of the rules matched against orders (`R4` or `STU3`)
    #[serde(default)]
    pub fhir_version: FhirVersion,
}

impl RulesConfig {
    fn validate(&self) -> Result<(), String> {
        if self.index_path.trim().is_empty() {
            return Err("rules.index_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            fhir_version: FhirVersion::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8090/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_index_path() -> String {
    "rules/index.toml".to_string()
}

fn default_local_path() -> String {
    "/var/log/crd".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
