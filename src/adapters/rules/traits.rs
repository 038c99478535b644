//! Rule store and evaluation engine seams
//!
//! The bundle processor only talks to these traits. Both are read-only
//! services shared behind `Arc` across requests.

use crate::domain::{
    Criterion, EvaluableRule, ExecutionContext, ExecutionParameters, FhirVersion, Result,
    RuleMapping,
};

/// Rule-set lookup
///
/// Implementations map criteria to rule topics and load the rule library for
/// a topic.
pub trait RuleStore: Send + Sync {
    /// Rule mappings matching a criterion, in index order
    ///
    /// No match is an empty list, never an error.
    fn find_rules(&self, criterion: &Criterion) -> Vec<RuleMapping>;

    /// Loads the evaluable rule for a topic
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::RuleError::TopicNotFound`] when nothing is
    /// stored for the topic and version.
    fn load_evaluable(&self, topic: &str, fhir_version: FhirVersion) -> Result<EvaluableRule>;
}

/// Builds the engine's execution context for one rule
pub trait ContextBuilder: Send + Sync {
    /// Binds parameters to a rule library
    ///
    /// # Errors
    ///
    /// Returns an error when the rule cannot be prepared for execution.
    fn build_context(
        &self,
        rule: &EvaluableRule,
        parameters: &ExecutionParameters,
        base_url: &str,
    ) -> Result<ExecutionContext>;
}
