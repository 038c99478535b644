//! Core business logic for CRD.
//!
//! # Modules
//!
//! - [`correlate`] - Typed record extraction and reference resolution
//! - [`criteria`] - Criteria resolution with the default-payer fallback
//! - [`selection`] - Order-select allow-list filtering
//! - [`processor`] - Per-kind bundle processing into rule results
//! - [`backfill`] - Prefetch backfill through one FHIR batch request
//! - [`discovery`] - Orchestration of backfill and processing
//!
//! # Discovery Workflow
//!
//! 1. **Backfill**: Fetch records the initiating draft order references but
//!    the prefetch lacks, and merge them into the order's partition
//! 2. **Extract**: Pull typed orders out of each prefetch partition
//! 3. **Resolve**: Derive (code, code system, payer) criteria per order
//! 4. **Match**: Look up rule mappings per criterion
//! 5. **Assemble**: Build one execution context per (order, rule) pair
//!
//! # Example
//!
//! ```rust,no_run
//! use crd::adapters::fhir::HttpFhirClient;
//! use crd::adapters::rules::{FileRuleStore, ParameterContextBuilder};
//! use crd::config::load_config;
//! use crd::core::discovery::DiscoveryService;
//! use crd::domain::CrdRequest;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("crd.toml")?;
//! let service = DiscoveryService::new(
//!     Arc::new(FileRuleStore::from_path(&config.rules.index_path)?),
//!     Arc::new(ParameterContextBuilder::new()),
//!     Arc::new(HttpFhirClient::new(&config.fhir)?),
//! )
//! .with_config(&config);
//!
//! let request = CrdRequest::from_json(&std::fs::read_to_string("request.json")?)?;
//! let summary = service.discover(request, &config.application.base_url).await?;
//! println!("{} rule(s) matched", summary.results.len());
//! # Ok(())
//! # }
//! ```

pub mod backfill;
pub mod correlate;
pub mod criteria;
pub mod discovery;
pub mod processor;
pub mod selection;
