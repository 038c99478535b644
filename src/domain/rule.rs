//! Rule mappings, evaluable rules and per-rule results

use super::criteria::{Criterion, FhirVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Association from a criterion to a rule topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMapping {
    pub topic: String,
    pub fhir_version: FhirVersion,
    pub code: String,
    pub code_system: String,
    pub payer: String,
}

/// A loaded rule library ready for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluableRule {
    pub topic: String,
    pub fhir_version: FhirVersion,
    pub library_name: String,
    pub source: String,
}

/// Everything the engine needs to execute one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub topic: String,
    pub library: String,
    pub base_url: String,

    /// Named parameters (role name to record JSON)
    pub parameters: BTreeMap<String, Value>,
}

/// Outcome of one (record, matched rule) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub criterion: Criterion,
    pub topic: String,
    pub context: ExecutionContext,
}

impl RuleResult {
    pub fn new(criterion: Criterion, topic: impl Into<String>, context: ExecutionContext) -> Self {
        Self {
            criterion,
            topic: topic.into(),
            context,
        }
    }
}
