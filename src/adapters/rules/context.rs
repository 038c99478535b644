//! Execution context assembly
//!
//! Binds a rule library to its named parameters and the service base URL.
//! Executing the library is the engine's job and happens downstream.

use super::traits::ContextBuilder;
use crate::domain::{CrdError, EvaluableRule, ExecutionContext, ExecutionParameters, Result};

/// Builds execution contexts from the parameter set's named roles
#[derive(Debug, Clone, Default)]
pub struct ParameterContextBuilder;

impl ParameterContextBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ContextBuilder for ParameterContextBuilder {
    fn build_context(
        &self,
        rule: &EvaluableRule,
        parameters: &ExecutionParameters,
        base_url: &str,
    ) -> Result<ExecutionContext> {
        if rule.source.trim().is_empty() {
            return Err(CrdError::Evaluation(format!(
                "Rule library '{}' for topic {} is empty",
                rule.library_name, rule.topic
            )));
        }

        Ok(ExecutionContext {
            topic: rule.topic.clone(),
            library: rule.source.clone(),
            base_url: base_url.to_string(),
            parameters: parameters.to_named(),
        })
    }
}
