//! Result type alias for Vaxflow
//!
//! This module provides a convenient Result type alias that uses
//! VaxflowError as the error type.

use super::errors::VaxflowError;

/// Result type alias for Vaxflow operations
///
/// This is a convenience type alias that uses `VaxflowError` as the error
/// type. Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use vaxflow::domain::result::Result;
/// use vaxflow::domain::errors::VaxflowError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(VaxflowError::Job("unknown job".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VaxflowError>;
