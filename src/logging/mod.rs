//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted file logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use crd::logging::init_logging;
//! use crd::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log a data-quality gap that the pipeline works around
///
/// # Example
///
/// ```no_run
/// use crd::log_data_gap;
///
/// log_data_gap!("devreq-013", "no patient matches subject reference");
/// ```
#[macro_export]
macro_rules! log_data_gap {
    ($record_id:expr, $gap:expr) => {
        tracing::warn!(
            record_id = %$record_id,
            gap = %$gap,
            "Data quality gap"
        );
    };
}

/// Log a rule attempt that failed and was omitted from the results
///
/// # Example
///
/// ```no_run
/// use crd::log_rule_failure;
/// use crd::domain::RuleFailure;
///
/// let failure = RuleFailure::new("devreq-013", "HomeOxygenTherapy", "E0424", "empty library");
/// log_rule_failure!(&failure);
/// ```
#[macro_export]
macro_rules! log_rule_failure {
    ($failure:expr) => {
        tracing::warn!(
            record_id = %$failure.record_id,
            topic = %$failure.topic,
            criterion = %$failure.criterion,
            error = %$failure.message,
            "Rule skipped"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use crd::log_error_with_context;
/// use crd::domain::CrdError;
///
/// let error = CrdError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log the completion of a discovery run
///
/// # Example
///
/// ```no_run
/// use crd::log_discovery_complete;
/// use std::time::Duration;
///
/// log_discovery_complete!("order-sign", 3, 0, Duration::from_millis(42));
/// ```
#[macro_export]
macro_rules! log_discovery_complete {
    ($hook:expr, $results:expr, $failures:expr, $duration:expr) => {
        tracing::info!(
            hook = %$hook,
            results = $results,
            failures = $failures,
            duration_ms = $duration.as_millis(),
            "Discovery completed"
        );
    };
}
