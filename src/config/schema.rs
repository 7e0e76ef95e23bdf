//! Configuration schema types
//!
//! This module defines the configuration structure for Vaxflow.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main Vaxflow configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaxflowConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Immunisation registry configuration
    pub registry: RegistryConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Submission pipeline tuning
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VaxflowConfig {
    /// Loads and validates a configuration from a TOML file
    ///
    /// Convenience wrapper around [`crate::config::load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        crate::config::loader::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.registry.validate(&self.environment)?;
        self.auth.validate()?;
        self.submission.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (plan batches and build requests without submitting)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per batch, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier applied after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(format!(
                "registry.retry.max_attempts must be between 1 and 10, got {}",
                self.max_attempts
            ));
        }
        if self.base_delay_ms == 0 {
            return Err("registry.retry.base_delay_ms must be > 0".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "registry.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Immunisation registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API
    pub base_url: String,

    /// TLS certificate verification enabled
    ///
    /// **SECURITY WARNING**: Disabling TLS verification (setting to `false`)
    /// exposes the application to man-in-the-middle attacks and should ONLY
    /// be used in development/testing environments.
    ///
    /// - In **production** environments, this MUST be set to `true`
    ///   (enforced by validation)
    /// - Default: `true`
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RegistryConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("registry.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("registry.base_url must start with http:// or https://".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("registry.timeout_seconds must be > 0".to_string());
        }

        // TLS verification is non-negotiable against a production registry
        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments. \
                Either set 'tls_verify = true', or set 'environment = \"development\"' or \
                'environment = \"staging\"' for test registries."
                    .to_string(),
            );
        }

        self.retry.validate()?;
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7100/registry".to_string(),
            tls_verify: true,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Authentication configuration
///
/// Credentials used by the default token provider to obtain a bearer
/// credential. Token acquisition mechanics stay behind the
/// `CredentialProvider` seam; this section only carries what that provider
/// needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token endpoint URL (defaults to `{registry.base_url}/oauth/token`)
    #[serde(default)]
    pub token_url: Option<String>,

    /// Client identifier
    pub client_id: String,

    /// Client secret
    /// Stored securely in memory and automatically zeroized on drop
    pub client_secret: SecretString,

    /// Seconds before nominal expiry at which a credential is treated as
    /// expired, so refresh happens ahead of the registry rejecting it
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: u64,
}

impl AuthConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.client_id.is_empty() {
            return Err("auth.client_id cannot be empty".to_string());
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err("auth.client_secret cannot be empty".to_string());
        }
        if let Some(ref url) = self.token_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("auth.token_url must start with http:// or https://".to_string());
            }
        }
        Ok(())
    }
}

/// Submission pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Consecutive failed progress polls tolerated before a connectivity
    /// error is surfaced to the observer
    #[serde(default = "default_poll_failure_tolerance")]
    pub poll_failure_tolerance: u32,

    /// Consecutive batches failing on transport errors before the job is
    /// moved to the error state
    #[serde(default = "default_transport_failure_threshold")]
    pub transport_failure_threshold: u32,

    /// Graceful shutdown timeout in seconds: the maximum time to wait for
    /// the in-flight batch to complete before forcing shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl SubmissionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.poll_failure_tolerance == 0 {
            return Err("submission.poll_failure_tolerance must be > 0".to_string());
        }
        if self.transport_failure_threshold == 0 {
            return Err("submission.transport_failure_threshold must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            poll_failure_tolerance: default_poll_failure_tolerance(),
            transport_failure_threshold: default_transport_failure_threshold(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_refresh_margin_seconds() -> u64 {
    60
}

fn default_poll_failure_tolerance() -> u32 {
    3
}

fn default_transport_failure_threshold() -> u32 {
    2
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
