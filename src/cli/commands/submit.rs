//! Submit command implementation
//!
//! This module implements the `submit` command: load a validated record
//! set from a JSON file, run a submission job to completion, and export
//! the per-row report.

use crate::adapters::auth::{CredentialCache, OAuthCredentialProvider};
use crate::adapters::registry::HttpRegistryClient;
use crate::config::load_config;
use crate::core::coordinator::SubmissionCoordinator;
use crate::core::job::{JobStatus, ProgressMonitor};
use crate::core::planner::plan_batches;
use crate::domain::ids::ProviderId;
use crate::domain::record::Record;
use clap::Args;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the submit command
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Path to the validated record set (JSON array of records)
    #[arg(long)]
    pub records: String,

    /// Submitting provider number
    #[arg(long)]
    pub provider: String,

    /// Write the submission report to this path (JSON)
    #[arg(long)]
    pub report: Option<String>,

    /// Accept pended records as-is instead of stopping for review
    #[arg(long)]
    pub auto_confirm: bool,

    /// Plan batches without submitting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SubmitArgs {
    /// Execute the submit command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting submit command");

        let mut config = load_config(config_path)?;
        if self.dry_run {
            config.application.dry_run = true;
        }

        // Load the validated record set
        let contents = fs::read_to_string(&self.records)?;
        let records: Vec<Record> = serde_json::from_str(&contents)?;
        let provider = match ProviderId::new(&self.provider) {
            Ok(p) => p,
            Err(e) => {
                println!("Invalid provider number: {e}");
                return Ok(2);
            }
        };

        println!("Loaded {} records from {}", records.len(), self.records);

        if config.application.dry_run {
            return Self::print_plan(&records, &provider);
        }

        // Wire up the pipeline
        let credential_provider = Arc::new(OAuthCredentialProvider::new(
            &config.auth,
            &config.registry.base_url,
            Duration::from_secs(config.registry.timeout_seconds),
        )?);
        let credentials = Arc::new(CredentialCache::new(
            credential_provider,
            Duration::from_secs(config.auth.refresh_margin_seconds),
        ));
        let registry = Arc::new(HttpRegistryClient::new(&config.registry, credentials)?);
        let coordinator = SubmissionCoordinator::from_config(&config, registry);

        let job_id = coordinator.start(&records, provider).await?;
        println!("Submission started: job {job_id}");

        // Poll progress until the job settles; tolerate transient poll
        // failures up to the configured run length.
        let mut monitor = ProgressMonitor::new(config.submission.poll_failure_tolerance);
        let final_status = loop {
            tokio::select! {
                _ = shutdown_signal.changed() => {
                    if *shutdown_signal.borrow() {
                        println!();
                        println!("Shutdown requested; pausing after the in-flight batch");
                        if let Err(e) = coordinator.pause(&job_id).await {
                            tracing::warn!(error = %e, "Could not pause job on shutdown");
                        }
                        break JobStatus::Paused;
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(250)) => {
                    let snapshot = match monitor.observe(coordinator.progress(&job_id).await) {
                        Ok(Some(snapshot)) => snapshot,
                        Ok(None) => continue,
                        Err(e) => {
                            println!("Lost contact with the submission job: {e}");
                            return Ok(3);
                        }
                    };

                    tracing::debug!(
                        completed = snapshot.completed_batches,
                        total = snapshot.total_batches,
                        "Progress"
                    );

                    match snapshot.status {
                        JobStatus::Confirming if self.auto_confirm => {
                            println!(
                                "{} records pended; confirming all as submitted",
                                snapshot.pending_confirmation.len()
                            );
                            let summary = coordinator.confirm_all(&job_id).await?;
                            println!(
                                "Confirmed {}, failed {}, skipped {}",
                                summary.confirmed, summary.failed, summary.skipped
                            );
                            if summary.failed > 0 {
                                // Leave the rest for manual review
                                coordinator.cancel_confirmations(&job_id).await?;
                            }
                        }
                        JobStatus::Confirming => break JobStatus::Confirming,
                        status if status.is_terminal() => break status,
                        _ => {}
                    }
                }
            }
        };

        // Export the report whatever state the job settled in
        let report = coordinator.export(&job_id).await?;
        report.log_summary();

        println!();
        println!("Submission Summary:");
        println!("  Status: {}", report.status);
        println!(
            "  Batches: {}/{}",
            report.totals.completed_batches, report.totals.total_batches
        );
        println!("  Successful: {}", report.totals.successful_records);
        println!("  Failed: {}", report.totals.failed_records);
        println!(
            "  Pending confirmation: {}",
            report.totals.pending_confirmation
        );

        if final_status == JobStatus::Confirming {
            println!();
            println!("Records awaiting confirm-or-correct:");
            for row in &report.rows {
                if row.claim_id.is_some() {
                    println!("  row {}: {}", row.row_number, row.message);
                }
            }
            println!("Re-run with --auto-confirm to accept them as submitted.");
        }

        if let Some(ref path) = self.report {
            fs::write(path, serde_json::to_string_pretty(&report)?)?;
            println!();
            println!("Report written to {path}");
        }

        Ok(match final_status {
            JobStatus::Completed => 0,
            JobStatus::Error => 3,
            _ => 4,
        })
    }

    /// Prints the batch plan without submitting
    fn print_plan(records: &[Record], provider: &ProviderId) -> anyhow::Result<i32> {
        println!("DRY RUN - nothing will be submitted");
        println!();

        let plan = plan_batches(records, provider);
        println!("Plan for provider {provider}:");
        println!("  Batches: {}", plan.batches.len());
        for batch in &plan.batches {
            println!(
                "    batch {}: {} encounters, {} records",
                batch.sequence,
                batch.encounters.len(),
                batch.record_count()
            );
        }
        if !plan.rejected.is_empty() {
            println!("  Rejected records:");
            for rejection in &plan.rejected {
                println!("    {rejection}");
            }
        }
        Ok(0)
    }
}
