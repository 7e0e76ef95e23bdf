//! Configuration management for Vaxflow.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Vaxflow uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`VAXFLOW_*` prefix)
//! - Default values for optional settings
//! - Comprehensive validation
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vaxflow::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vaxflow.toml")?;
//!
//! println!("Registry URL: {}", config.registry.base_url);
//! println!("Retry attempts: {}", config.registry.retry.max_attempts);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [registry]
//! base_url = "https://registry.example.com/api"
//! timeout_seconds = 30
//!
//! [registry.retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [auth]
//! client_id = "portal-client"
//! client_secret = "${VAXFLOW_AUTH_CLIENT_SECRET}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuthConfig, Environment, LoggingConfig, RegistryConfig, RetryConfig,
    SubmissionConfig, VaxflowConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
