// Vaxflow - Vaccination Record Submission Pipeline
// Copyright (c) 2025 Vaxflow Contributors
// Licensed under the MIT License

//! # Vaxflow - Vaccination Record Submission Pipeline
//!
//! Vaxflow is the submission core of a healthcare-data portal: it takes
//! validated patient/vaccination records, partitions them into
//! protocol-compliant batches, submits them to an external immunisation
//! registry, and reconciles the mixed per-batch/per-record response model
//! through a resumable job state machine with a confirm-or-correct
//! handshake and per-record resubmission.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Planning** records into encounters and batches within protocol limits
//! - **Dispatching** batches sequentially with retry and backoff
//! - **Interpreting** registry responses into typed per-record outcomes
//! - **Reconciling** pended records via confirmation or resubmission
//!
//! ## Architecture
//!
//! Vaxflow follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (planning, dispatch, confirmation, retry)
//! - [`adapters`] - External integrations (registry protocol, credentials)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vaxflow::adapters::auth::{CredentialCache, OAuthCredentialProvider};
//! use vaxflow::adapters::registry::HttpRegistryClient;
//! use vaxflow::config::VaxflowConfig;
//! use vaxflow::core::coordinator::SubmissionCoordinator;
//! use vaxflow::domain::ids::ProviderId;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = VaxflowConfig::from_file("vaxflow.toml")?;
//!
//!     // Wire up credentials and the registry client
//!     let provider = Arc::new(OAuthCredentialProvider::new(
//!         &config.auth,
//!         &config.registry.base_url,
//!         Duration::from_secs(config.registry.timeout_seconds),
//!     )?);
//!     let credentials = Arc::new(CredentialCache::new(
//!         provider,
//!         Duration::from_secs(config.auth.refresh_margin_seconds),
//!     ));
//!     let registry = Arc::new(HttpRegistryClient::new(&config.registry, credentials)?);
//!
//!     // Create the coordinator and start a job
//!     let coordinator = SubmissionCoordinator::from_config(&config, registry);
//!     let records = vec![/* validated records from the upload layer */];
//!     let submitter = ProviderId::new("2447051W")?;
//!     let job_id = coordinator.start(&records, submitter).await?;
//!
//!     let snapshot = coordinator.progress(&job_id).await?;
//!     println!("{}/{} batches complete", snapshot.completed_batches, snapshot.total_batches);
//!     Ok(())
//! }
//! ```
//!
//! ## Outcome Model
//!
//! Every submitted record resolves to a [`domain::RecordResult`] carrying
//! the registry's status code and its message text byte-for-byte. Outcomes
//! with `action_required = ConfirmOrCorrect` queue up for a human decision:
//! either accept the record as-is (confirmation) or resubmit corrected data
//! (resubmission). The registry's message is a hard display contract and is
//! never paraphrased.
//!
//! ## Error Handling
//!
//! Vaxflow uses the [`domain::VaxflowError`] type for all errors:
//!
//! ```rust,no_run
//! use vaxflow::domain::VaxflowError;
//!
//! fn example() -> Result<(), VaxflowError> {
//!     let config = vaxflow::config::load_config("vaxflow.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Vaxflow uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn, error};
//!
//! info!(job_id = "c1f0", "Starting submission");
//! warn!(row = 7, "Record pended for confirmation");
//! error!(error = "timeout", "Batch failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
