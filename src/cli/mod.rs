//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Vaxflow using clap.
//! The CLI is a thin driver over the library API; the portal surface that
//! normally feeds the pipeline lives elsewhere.

pub mod commands;

use clap::{Parser, Subcommand};

/// Vaxflow - Vaccination Record Submission Pipeline
#[derive(Parser, Debug)]
#[command(name = "vaxflow")]
#[command(version, about, long_about = None)]
#[command(author = "Vaxflow Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vaxflow.toml", env = "VAXFLOW_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VAXFLOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a validated record set to the registry
    Submit(commands::submit::SubmitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
