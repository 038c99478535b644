//! Domain models and types for CRD.
//!
//! This module contains the types the discovery pipeline works on: the
//! minimal FHIR resource model, the per-request prefetch collection, matching
//! criteria, rule mappings and execution parameter sets.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **FHIR resources** ([`Resource`], [`Bundle`], typed order models)
//! - **Prefetch collection** ([`Prefetch`], [`PrefetchKey`])
//! - **Criteria and rules** ([`Criterion`], [`Payer`], [`RuleMapping`], [`RuleResult`])
//! - **Execution parameters** ([`ExecutionParameters`], [`ParameterRole`])
//! - **Error types** ([`CrdError`], [`FhirError`], [`RuleError`])
//! - **Result type alias** ([`Result`])
//!
//! # Resources
//!
//! Resources (de)serialize by `resourceType`. Typed records are borrowed out
//! of a heterogeneous bundle with [`Resource::as_kind`]:
//!
//! ```rust
//! use crd::domain::{DeviceRequest, Resource};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resource: Resource = serde_json::from_str(
//!     r#"{"resourceType": "DeviceRequest", "id": "devreq-1", "status": "draft"}"#,
//! )?;
//! let request = resource.as_kind::<DeviceRequest>().ok_or("not a device request")?;
//! assert_eq!(request.id.as_deref(), Some("devreq-1"));
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CrdError>`]. Only
//! [`CrdError::RequestIncomplete`] and [`CrdError::Configuration`] abort a
//! request; see [`CrdError::is_terminal`].

pub mod criteria;
pub mod errors;
pub mod ids;
pub mod order;
pub mod parameters;
pub mod prefetch;
pub mod request;
pub mod resource;
pub mod result;
pub mod rule;

// Re-export commonly used types for convenience
pub use criteria::{Criterion, FhirVersion, Payer, DEFAULT_PAYER_ID, DEFAULT_PAYER_NAME};
pub use errors::{CrdError, FhirError, RuleError, RuleFailure};
pub use ids::ReferenceId;
pub use order::OrderResource;
pub use parameters::{ExecutionParameters, ParameterRole};
pub use prefetch::{Prefetch, PrefetchKey};
pub use request::{CrdRequest, FhirAuthorization, Hook, HookContext};
pub use resource::{
    Bundle, BundleEntry, BundleType, CodeableConcept, Coding, Coverage, DeviceRequest,
    GenericResource, HttpVerb, MedicationDispense, MedicationRequest, MedicationStatement,
    Organization, Patient, PractitionerRole, Reference, Resource, ResourceKind, ServiceRequest,
};
pub use result::Result;
pub use rule::{EvaluableRule, ExecutionContext, RuleMapping, RuleResult};
