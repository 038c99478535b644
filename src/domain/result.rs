//! Result type alias for CRD

use super::errors::CrdError;

/// Result type alias for CRD operations
///
/// # Examples
///
/// ```
/// use crd::domain::result::Result;
/// use crd::domain::errors::CrdError;
///
/// fn failing_function() -> Result<()> {
///     Err(CrdError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CrdError>;
