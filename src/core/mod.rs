//! Core business logic for Vaxflow.
//!
//! This module contains the submission pipeline proper.
//!
//! # Modules
//!
//! - [`planner`] - Batch planning (encounter grouping, protocol limits)
//! - [`job`] - Job state machine, progress snapshots and polling monitor
//! - [`coordinator`] - Dispatch orchestration across all active jobs
//! - [`confirm`] - Confirm-or-correct round-trips
//! - [`resubmit`] - Per-record resubmission
//! - [`retry`] - Failure classification and exponential backoff
//! - [`report`] - Exportable per-job reports
//!
//! # Submission Workflow
//!
//! 1. **Plan**: Group validated records into protocol-legal batches
//! 2. **Dispatch**: Submit batches sequentially through the retry policy
//! 3. **Record**: Flatten registry responses into per-record outcomes
//! 4. **Reconcile**: Surface pended outcomes for confirm-or-correct,
//!    resubmit corrected records
//! 5. **Report**: Export the per-row report once nothing remains pending
//!
//! # Example
//!
//! ```rust,no_run
//! use vaxflow::adapters::registry::RegistryApi;
//! use vaxflow::core::coordinator::SubmissionCoordinator;
//! use vaxflow::core::retry::RetryPolicy;
//! use vaxflow::domain::ids::ProviderId;
//! use std::sync::Arc;
//!
//! # async fn example(registry: Arc<dyn RegistryApi>, records: Vec<vaxflow::domain::Record>) -> vaxflow::domain::Result<()> {
//! let coordinator = SubmissionCoordinator::new(registry, RetryPolicy::default(), 2);
//!
//! let provider = ProviderId::new("2447051W").map_err(vaxflow::domain::VaxflowError::Configuration)?;
//! let job_id = coordinator.start(&records, provider).await?;
//!
//! let snapshot = coordinator.progress(&job_id).await?;
//! println!("{}/{} batches", snapshot.completed_batches, snapshot.total_batches);
//! # Ok(())
//! # }
//! ```

pub mod confirm;
pub mod coordinator;
pub mod job;
pub mod planner;
pub mod report;
pub mod resubmit;
pub mod retry;

pub use confirm::{ConfirmationManager, ConfirmationSummary};
pub use coordinator::SubmissionCoordinator;
pub use job::{JobEvent, JobStatus, ProgressMonitor, ProgressSnapshot, SubmissionJob};
pub use planner::{plan_batches, BatchPlan, SubmissionPlan};
pub use report::SubmissionReport;
pub use resubmit::ResubmissionHandler;
pub use retry::RetryPolicy;
