//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "crd.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing CRD configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point rules.index_path at your rule index");
                println!("  3. Optionally set CRD_FHIR_ACCESS_TOKEN in a .env file");
                println!("  4. Validate configuration: crd validate-config --check-rules");
                println!("  5. Run discovery: crd discover --request order-sign.json");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# CRD Configuration File
# Coverage Requirements Discovery pipeline

environment = "development"

[application]
log_level = "info"
base_url = "http://localhost:8090/"

[fhir]
timeout_seconds = 30
tls_verify = true

[backfill]
enabled = true

[rules]
index_path = "rules/index.toml"

[logging]
local_enabled = false
local_path = "/var/log/crd"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# CRD Configuration File
# Coverage Requirements Discovery pipeline
#
# Values of the form ${VAR} are replaced from the environment. Every setting
# can also be overridden with a CRD_<SECTION>_<KEY> environment variable,
# e.g. CRD_FHIR_TIMEOUT_SECONDS=10.

# Runtime environment: development | staging | production
environment = "development"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Public base URL of this service, handed to the rule engine
base_url = "http://localhost:8090/"

# ============================================================================
# FHIR Server (prefetch backfill)
# ============================================================================
[fhir]
# Fallback FHIR server for requests without fhirServer
# server_url = "https://ehr.example.com/fhir/r4"

# Fallback bearer token for requests without fhirAuthorization
# access_token = "${CRD_FHIR_TOKEN}"

# Transport timeout for the batch request
timeout_seconds = 30

# TLS certificate verification (cannot be disabled in production)
tls_verify = true

# ============================================================================
# Prefetch Backfill
# ============================================================================
[backfill]
# Fetch referenced records missing from the prefetch before processing
enabled = true

# ============================================================================
# Rules
# ============================================================================
[rules]
# TOML index of [[rules]] entries (code, code_system, payer, topic,
# fhir_version, library). Library paths are relative to the index.
index_path = "rules/index.toml"
# FHIR release of the rules matched against orders: R4 or STU3
fhir_version = "R4"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = false

# Local log file directory
local_path = "/var/log/crd"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
