//! Inbound CDS Hooks request
//!
//! Only the members the discovery pipeline reads are modelled. Schema
//! validation of the request body is the HTTP layer's concern.

use super::prefetch::Prefetch;
use super::resource::{Bundle, Resource};
use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CDS Hooks hook served by this pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hook {
    #[serde(rename = "order-sign")]
    OrderSign,
    #[serde(rename = "order-select")]
    OrderSelect,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::OrderSign => "order-sign",
            Hook::OrderSelect => "order-select",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth credentials the EHR grants for calling back into its FHIR server
#[derive(Debug, Clone, Deserialize)]
pub struct FhirAuthorization {
    pub access_token: SecretString,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Hook context
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookContext {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub patient_id: Option<String>,

    #[serde(default)]
    pub encounter_id: Option<String>,

    /// Ids of the orders the user selected (order-select only)
    #[serde(default)]
    pub selections: Vec<String>,

    #[serde(default)]
    pub draft_orders: Option<Bundle>,
}

impl HookContext {
    /// Draft orders, in bundle order
    pub fn draft_order_resources(&self) -> Vec<&Resource> {
        self.draft_orders
            .as_ref()
            .map(|bundle| bundle.resources().collect())
            .unwrap_or_default()
    }
}

/// A CDS Hooks request for coverage requirements discovery
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdRequest {
    pub hook: Hook,

    #[serde(default)]
    pub hook_instance: Option<String>,

    /// Base URL of the EHR's FHIR server
    #[serde(default)]
    pub fhir_server: Option<String>,

    #[serde(default)]
    pub fhir_authorization: Option<FhirAuthorization>,

    #[serde(default)]
    pub context: HookContext,

    #[serde(default)]
    pub prefetch: Prefetch,
}

impl CrdRequest {
    /// Creates a request with an empty context and prefetch
    pub fn new(hook: Hook) -> Self {
        Self {
            hook,
            hook_instance: None,
            fhir_server: None,
            fhir_authorization: None,
            context: HookContext::default(),
            prefetch: Prefetch::default(),
        }
    }

    pub fn with_fhir_server(mut self, fhir_server: impl Into<String>) -> Self {
        self.fhir_server = Some(fhir_server.into());
        self
    }

    pub fn with_draft_orders(mut self, draft_orders: Bundle) -> Self {
        self.context.draft_orders = Some(draft_orders);
        self
    }

    pub fn with_selections(mut self, selections: Vec<String>) -> Self {
        self.context.selections = selections;
        self
    }

    pub fn with_prefetch(mut self, prefetch: Prefetch) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Parses a request from its JSON body
    pub fn from_json(body: &str) -> crate::domain::Result<Self> {
        serde_json::from_str(body).map_err(|e| {
            crate::domain::CrdError::RequestIncomplete(format!("Malformed CDS Hooks request: {e}"))
        })
    }
}
