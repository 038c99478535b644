//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the CRD configuration file and the rule index it points at.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::adapters::rules::FileRuleStore;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also load the rule index and every library it names
    #[arg(long)]
    pub check_rules: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Base URL: {}", config.application.base_url);
        println!(
            "  Fallback FHIR Server: {}",
            config.fhir.server_url.as_deref().unwrap_or("(request only)")
        );
        println!(
            "  Fallback Access Token: {}",
            if config.fhir.access_token.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        println!("  FHIR Timeout: {}s", config.fhir.timeout_seconds);
        println!("  Backfill: {}", if config.backfill.enabled { "enabled" } else { "disabled" });
        println!("  Rule Index: {}", config.rules.index_path);
        println!();

        if self.check_rules {
            match FileRuleStore::from_path(&config.rules.index_path) {
                Ok(store) => {
                    println!("✅ Rule index loaded: {} mapping(s)", store.mapping_count());
                }
                Err(e) => {
                    println!("❌ Rule index failed to load");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        }

        Ok(EXIT_OK)
    }
}
