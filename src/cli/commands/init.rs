//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "vaxflow.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing Vaxflow configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your registry endpoint", self.output);
                println!("  2. Set VAXFLOW_AUTH_CLIENT_SECRET in your environment or .env file");
                println!("  3. Validate configuration: vaxflow validate-config");
                println!("  4. Submit a record set: vaxflow submit --records records.json --provider <number>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Sample configuration content
    fn sample_config() -> &'static str {
        r#"# Vaxflow Configuration File
# Vaccination Record Submission Pipeline

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"
# Plan batches and build requests without submitting
dry_run = false

# Runtime environment: development, staging, production
# TLS verification cannot be disabled in production.
environment = "development"

[registry]
base_url = "https://registry.example.com/api"
tls_verify = true
timeout_seconds = 30

[registry.retry]
# Attempts per batch, first try included
max_attempts = 3
base_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[auth]
# Token endpoint defaults to "{registry.base_url}/oauth/token"
client_id = "portal-client"
client_secret = "${VAXFLOW_AUTH_CLIENT_SECRET}"
refresh_margin_seconds = 60

[submission]
poll_failure_tolerance = 3
transport_failure_threshold = 2
shutdown_timeout_secs = 30

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("vaxflow.toml");
        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };

        let code = args.execute().await.unwrap();
        assert_eq!(code, 0);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("vaxflow.toml");
        std::fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_sample_parses_with_secret_set() {
        std::env::set_var("VAXFLOW_AUTH_CLIENT_SECRET", "s3cret");
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("vaxflow.toml");
        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        args.execute().await.unwrap();

        let config = crate::config::load_config(&output.to_string_lossy().to_string());
        assert!(config.is_ok(), "{:?}", config.err().map(|e| e.to_string()));
        std::env::remove_var("VAXFLOW_AUTH_CLIENT_SECRET");
    }
}
