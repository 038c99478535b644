//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod discover;
pub mod init;
pub mod validate;

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;

/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;

/// Exit code for a malformed CDS Hooks request
pub const EXIT_MALFORMED_REQUEST: i32 = 3;

/// Exit code for fatal errors
pub const EXIT_FATAL: i32 = 5;
