//! Domain error types
//!
//! This module defines the error hierarchy for Vaxflow. All errors are
//! domain-specific and don't expose third-party types such as the HTTP
//! client's error values.

use crate::domain::outcome::FieldError;
use thiserror::Error;

/// Main Vaxflow error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum VaxflowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Registry-related errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Local record validation errors (pre-submission)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Job lookup or lifecycle errors
    #[error("Job error: {0}")]
    Job(String),

    /// Invalid job state transition
    #[error("State error: {0}")]
    State(String),

    /// Confirmation handling errors
    #[error("Confirmation error: {0}")]
    Confirmation(String),

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

/// Registry-specific errors
///
/// Errors that occur when talking to the immunisation registry. Transport
/// failures and explicit registry system-error codes are retryable;
/// business-rule rejections never are. The distinction drives the retry
/// policy, so each variant maps to exactly one failure class.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Failed to reach the registry at the transport level
    #[error("Failed to connect to registry: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Credentials were rejected outright
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A previously valid credential has expired (triggers one refresh)
    #[error("Authentication credential expired: {0}")]
    AuthExpired(String),

    /// Malformed request or response (fatal for that request, never retried)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than authentication)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Registry-reported system error code (retryable)
    #[error("Registry system error {code}: {message}")]
    SystemError { code: String, message: String },

    /// Registry-reported business rule rejection (never retried, message
    /// surfaced verbatim)
    #[error("{message}")]
    BusinessRule { code: String, message: String },
}

impl RegistryError {
    /// Whether the retry policy may re-issue the request automatically
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::ConnectionFailed(_)
                | RegistryError::Timeout(_)
                | RegistryError::ServerError { .. }
                | RegistryError::SystemError { .. }
        )
    }

    /// Whether this failure signals an expired credential
    pub fn is_auth_expiry(&self) -> bool {
        matches!(self, RegistryError::AuthExpired(_))
    }

    /// Whether the failure happened before the registry processed anything
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RegistryError::ConnectionFailed(_) | RegistryError::Timeout(_)
        )
    }
}

/// Local validation failure for a single record
///
/// Produced by the batch planner and the resubmission handler before
/// anything is sent to the registry. Rejects one record only; it never
/// blocks the rest of a batch.
#[derive(Debug, Clone, Error)]
#[error("row {row_number}: {message}")]
pub struct ValidationError {
    /// Source row the record came from
    pub row_number: usize,

    /// Human-readable summary of what failed
    pub message: String,

    /// Field-level details
    pub field_errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a new validation error for a row
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    /// Attaches a field-level error
    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.push(FieldError::new(field, message));
        self
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for VaxflowError {
    fn from(err: std::io::Error) -> Self {
        VaxflowError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VaxflowError {
    fn from(err: serde_json::Error) -> Self {
        VaxflowError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VaxflowError {
    fn from(err: toml::de::Error) -> Self {
        VaxflowError::Configuration(format!("TOML parse error: {err}"))
    }
}
