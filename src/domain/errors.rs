//! Domain error types
//!
//! This module defines the error hierarchy for CRD. Errors are domain-specific
//! and don't expose third-party types.
//!
//! Only two variants are terminal for a request: [`CrdError::RequestIncomplete`]
//! (the input cannot be decomposed) and [`CrdError::Configuration`]. Every other
//! failure inside the pipeline is recovered locally and reported as a diagnostic.

use thiserror::Error;

/// Main CRD error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum CrdError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request cannot be decomposed into criteria (malformed input)
    #[error("Request incomplete: {0}")]
    RequestIncomplete(String),

    /// FHIR server errors
    #[error("FHIR error: {0}")]
    Fhir(#[from] FhirError),

    /// Rule store errors
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Execution context could not be built for a rule
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CrdError {
    /// Whether this error must abort the whole request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrdError::RequestIncomplete(_) | CrdError::Configuration(_)
        )
    }
}

/// FHIR server errors
///
/// Errors that occur while talking to the EHR's FHIR endpoint during backfill.
/// These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum FhirError {
    /// Failed to connect to the FHIR server
    #[error("Failed to connect to FHIR server: {0}")]
    ConnectionFailed(String),

    /// The server rejected the bearer token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Rule store errors
#[derive(Debug, Error)]
pub enum RuleError {
    /// No evaluable rule is stored for the topic and FHIR version
    #[error("No rule stored for topic '{topic}' ({fhir_version})")]
    TopicNotFound { topic: String, fhir_version: String },

    /// The rule index file is malformed
    #[error("Invalid rule index: {0}")]
    InvalidIndex(String),

    /// A rule library file could not be read
    #[error("Failed to read rule library {path}: {reason}")]
    LibraryUnreadable { path: String, reason: String },
}

/// Diagnostic for one rule attempt that failed and was omitted from the results
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RuleFailure {
    /// Id of the record being processed
    pub record_id: String,

    /// Rule topic that failed
    pub topic: String,

    /// Criterion that matched the rule, rendered for display
    pub criterion: String,

    /// Error message
    pub message: String,
}

impl RuleFailure {
    /// Creates a new rule failure
    pub fn new(
        record_id: impl Into<String>,
        topic: impl Into<String>,
        criterion: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            topic: topic.into(),
            criterion: criterion.into(),
            message: message.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CrdError {
    fn from(err: std::io::Error) -> Self {
        CrdError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CrdError {
    fn from(err: serde_json::Error) -> Self {
        CrdError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CrdError {
    fn from(err: toml::de::Error) -> Self {
        CrdError::Configuration(format!("TOML parse error: {err}"))
    }
}
