//! External system integrations for CRD.
//!
//! - [`fhir`] - FHIR server access for prefetch backfill
//! - [`rules`] - Rule store and execution context seams
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The processor and the backfill
//! coordinator only see the `RuleStore`, `ContextBuilder` and
//! `FhirBatchClient` traits.
//!
//! # FHIR Adapter
//!
//! ```rust,no_run
//! use crd::adapters::fhir::{FhirBatchClient, FhirServer, HttpFhirClient};
//! use crd::config::{FhirConfig, SecretString};
//! use crd::domain::{Bundle, BundleType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpFhirClient::new(&FhirConfig::default())?;
//! let server = FhirServer::new(
//!     "https://ehr.example.com/fhir/r4",
//!     Some(SecretString::new("token".to_string())),
//! );
//!
//! let response = client
//!     .execute_batch(&server, &Bundle::of_type(BundleType::Batch))
//!     .await?;
//! println!("{} entries", response.entry.len());
//! # Ok(())
//! # }
//! ```

pub mod fhir;
pub mod rules;
