//! Discover command implementation
//!
//! Runs the discovery pipeline once for a CDS Hooks request read from a file
//! and prints the summary as JSON.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_MALFORMED_REQUEST, EXIT_OK};
use crate::adapters::fhir::HttpFhirClient;
use crate::adapters::rules::{FileRuleStore, ParameterContextBuilder};
use crate::config::load_config;
use crate::core::discovery::DiscoveryService;
use crate::domain::{CrdError, CrdRequest};
use clap::Args;
use std::fs;
use std::sync::Arc;

/// Arguments for the discover command
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Path of the CDS Hooks request JSON
    #[arg(short, long)]
    pub request: String,

    /// Override the rule index path
    #[arg(long)]
    pub rules: Option<String>,

    /// Override the service base URL handed to the rule engine
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip prefetch backfill
    #[arg(long)]
    pub no_backfill: bool,

    /// Write the summary to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl DiscoverArgs {
    /// Execute the discover command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(request = %self.request, "Starting discover command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(rules) = &self.rules {
            tracing::info!(index_path = %rules, "Overriding rule index from CLI");
            config.rules.index_path = rules.clone();
        }
        if let Some(base_url) = &self.base_url {
            tracing::info!(base_url = %base_url, "Overriding base URL from CLI");
            config.application.base_url = base_url.clone();
        }
        if self.no_backfill {
            tracing::info!("Disabling backfill from CLI");
            config.backfill.enabled = false;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let rules = match FileRuleStore::from_path(&config.rules.index_path) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load rule index");
                eprintln!("Failed to load rule index: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let fhir_client = match HttpFhirClient::new(&config.fhir) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("Failed to initialize FHIR client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let body = fs::read_to_string(&self.request)?;
        let request = match CrdRequest::from_json(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "Malformed request");
                eprintln!("{e}");
                return Ok(EXIT_MALFORMED_REQUEST);
            }
        };

        let service = DiscoveryService::new(
            Arc::new(rules),
            Arc::new(ParameterContextBuilder::new()),
            Arc::new(fhir_client),
        )
        .with_config(&config);

        let summary = match service.discover(request, &config.application.base_url).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Discovery failed");
                eprintln!("Discovery failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let rendered = serde_json::to_string_pretty(&summary)?;
        match &self.output {
            Some(path) => {
                fs::write(path, rendered)?;
                println!("✅ {} result(s) written to {path}", summary.results.len());
            }
            None => println!("{rendered}"),
        }

        if !summary.failures.is_empty() {
            eprintln!("⚠️  {} rule(s) skipped after errors", summary.failures.len());
        }

        Ok(EXIT_OK)
    }
}

/// Maps a terminal discovery error to its exit code
pub fn exit_code_for(error: &CrdError) -> i32 {
    match error {
        CrdError::Configuration(_) => EXIT_CONFIG,
        CrdError::RequestIncomplete(_) => EXIT_MALFORMED_REQUEST,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FhirError;
    use test_case::test_case;

    #[test_case(CrdError::Configuration("no server".into()), EXIT_CONFIG ; "configuration")]
    #[test_case(CrdError::RequestIncomplete("coded reference".into()), EXIT_MALFORMED_REQUEST ; "malformed")]
    #[test_case(CrdError::Fhir(FhirError::Timeout("30s".into())), EXIT_FATAL ; "other")]
    fn test_exit_code_for(error: CrdError, expected: i32) {
        assert_eq!(exit_code_for(&error), expected);
    }

    #[tokio::test]
    async fn test_missing_config_exits_with_config_code() {
        let args = DiscoverArgs {
            request: "request.json".to_string(),
            rules: None,
            base_url: None,
            no_backfill: false,
            output: None,
        };
        let code = args.execute("/nonexistent/crd.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
