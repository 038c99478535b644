//! Rule store and execution context adapters
//!
//! - [`traits`] - `RuleStore` and `ContextBuilder` seams
//! - [`file_store`] - TOML-indexed in-memory rule store
//! - [`context`] - Execution context assembly from parameter sets

pub mod context;
pub mod file_store;
pub mod traits;

pub use context::ParameterContextBuilder;
pub use file_store::{FileRuleStore, RuleIndexEntry};
pub use traits::{ContextBuilder, RuleStore};
