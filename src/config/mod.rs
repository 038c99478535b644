//! Configuration management for CRD.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! CRD uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CRD_*` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use crd::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("crd.toml")?;
//!
//! println!("Rule index: {}", config.rules.index_path);
//! println!("Backfill enabled: {}", config.backfill.enabled);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and the service's public base URL
//! - [`FhirConfig`] - Fallback FHIR endpoint, token, timeout and TLS settings
//! - [`BackfillConfig`] - Prefetch backfill switch
//! - [`RulesConfig`] - Rule index location
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//! base_url = "https://crd.example.com/"
//!
//! [fhir]
//! timeout_seconds = 30
//! access_token = "${CRD_FHIR_TOKEN}"
//!
//! [backfill]
//! enabled = true
//!
//! [rules]
//! index_path = "/etc/crd/rules.toml"
//! fhir_version = "R4"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, BackfillConfig, CrdConfig, Environment, FhirConfig, LoggingConfig,
    RulesConfig,
};

/// FHIR bearer tokens are held as `secrecy` secrets: redacted in `Debug`
/// output and zeroized on drop.
pub use secrecy::SecretString;
