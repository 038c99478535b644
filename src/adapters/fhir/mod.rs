//! FHIR server adapter used by prefetch backfill

pub mod client;

pub use client::{FhirBatchClient, FhirServer, HttpFhirClient, FHIR_JSON};
