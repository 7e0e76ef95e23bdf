//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating the
//! Vaxflow configuration file and optionally checking registry
//! connectivity.

use crate::adapters::auth::{CredentialCache, OAuthCredentialProvider};
use crate::adapters::registry::{HttpRegistryClient, RegistryApi};
use crate::config::load_config;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also check that the registry endpoint is reachable
    #[arg(long)]
    pub ping: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("Error: {e}");
                return Ok(2);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Environment: {:?}", config.environment);
        println!("  Registry: {}", config.registry.base_url);
        println!(
            "  Retry: {} attempts, {}ms base delay",
            config.registry.retry.max_attempts, config.registry.retry.base_delay_ms
        );
        println!("  Auth Client: {}", config.auth.client_id);

        if self.ping {
            println!();
            println!("Checking registry connectivity...");

            let provider = Arc::new(OAuthCredentialProvider::new(
                &config.auth,
                &config.registry.base_url,
                Duration::from_secs(config.registry.timeout_seconds),
            )?);
            let credentials = Arc::new(CredentialCache::new(
                provider,
                Duration::from_secs(config.auth.refresh_margin_seconds),
            ));
            let client = HttpRegistryClient::new(&config.registry, credentials)?;

            match client.ping().await {
                Ok(()) => println!("Registry is reachable"),
                Err(e) => {
                    println!("Registry is not reachable");
                    println!("Error: {e}");
                    return Ok(3);
                }
            }
        }

        Ok(0)
    }
}
