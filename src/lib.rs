// CRD - Coverage Requirements Discovery pipeline
// Copyright (c) 2025 CRD Contributors
// Licensed under the MIT License

//! # CRD - Coverage Requirements Discovery
//!
//! CRD decides which payer coverage-requirement rules apply to the orders in
//! a CDS Hooks `order-sign` or `order-select` request, and assembles the
//! execution context for each matched rule.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Backfilling** prefetch data the EHR did not send, with one FHIR batch request
//! - **Extracting** typed orders from the heterogeneous prefetch bundles
//! - **Resolving** (code, code system, payer) criteria with a default-payer fallback
//! - **Assembling** one execution context per (order, matched rule) pair
//!
//! ## Architecture
//!
//! CRD follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (backfill, criteria, processing, discovery)
//! - [`adapters`] - External integrations (FHIR server, rule store)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crd::adapters::fhir::HttpFhirClient;
//! use crd::adapters::rules::{FileRuleStore, ParameterContextBuilder};
//! use crd::config::load_config;
//! use crd::core::discovery::DiscoveryService;
//! use crd::domain::CrdRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("crd.toml")?;
//!
//!     let service = DiscoveryService::new(
//!         Arc::new(FileRuleStore::from_path(&config.rules.index_path)?),
//!         Arc::new(ParameterContextBuilder::new()),
//!         Arc::new(HttpFhirClient::new(&config.fhir)?),
//!     )
//!     .with_config(&config);
//!
//!     let request = CrdRequest::from_json(&std::fs::read_to_string("order-sign.json")?)?;
//!     let summary = service.discover(request, &config.application.base_url).await?;
//!
//!     println!("{} rule(s) matched", summary.results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! ### Prefetch Backfill
//!
//! The first draft order's references are checked against the prefetch. The
//! missing ones are fetched in a single `batch` Bundle, nested search results
//! are flattened, and the records are merged into the order's partition:
//!
//! ```rust
//! use crd::core::backfill::practitioner_role_query;
//!
//! assert!(practitioner_role_query("pr-1").starts_with("PractitionerRole?_id=pr-1&_include="));
//! ```
//!
//! ### Default Payer
//!
//! An order with no determinable payer is matched against the Centers for
//! Medicare and Medicaid Services:
//!
//! ```rust
//! use crd::domain::{Payer, DEFAULT_PAYER_ID};
//!
//! assert_eq!(Payer::default_payer().id, DEFAULT_PAYER_ID);
//! ```
//!
//! ## Error Handling
//!
//! CRD uses the [`domain::CrdError`] type for all errors. Only malformed
//! requests and missing configuration abort a request; failures of a single
//! rule are reported as [`domain::RuleFailure`] diagnostics.
//!
//! ## Logging
//!
//! CRD uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(hook = "order-sign", "Starting discovery");
//! warn!(record_id = "devreq013", gap = "no patient", "Data quality gap");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
