//! Submission coordinator - main orchestrator of the pipeline
//!
//! Owns the job registry and the dispatch loop. Dispatch within one job is
//! strictly sequential (one batch in flight at a time); independent jobs
//! run concurrently and share nothing but the credential cache. Pause takes
//! effect before the next batch is dispatched, never by aborting a request
//! already sent.

use crate::adapters::registry::models::BatchSubmitRequest;
use crate::adapters::registry::{parse_record_outcomes, RegistryApi};
use crate::config::VaxflowConfig;
use crate::core::confirm::{ConfirmationManager, ConfirmationSummary};
use crate::core::job::{JobEvent, JobHandle, JobStatus, ProgressSnapshot, SubmissionJob};
use crate::core::planner::plan_batches;
use crate::core::report::SubmissionReport;
use crate::core::resubmit::ResubmissionHandler;
use crate::core::retry::RetryPolicy;
use crate::domain::ids::{JobId, ProviderId};
use crate::domain::outcome::RecordResult;
use crate::domain::record::{EditedFields, Record};
use crate::domain::{Result, VaxflowError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What the dispatch loop decided to do next
enum DispatchStep {
    /// Submit the given batch (cloned out of the job)
    Submit {
        batch: crate::core::planner::BatchPlan,
        provider: ProviderId,
        correlation_id: String,
    },
    /// Wait until pause/confirmation state changes
    Wait,
    /// The job reached a terminal state
    Finished,
}

/// Orchestrates batch dispatch, state transitions and per-record actions
/// for all active jobs
#[derive(Clone)]
pub struct SubmissionCoordinator {
    registry: Arc<dyn RegistryApi>,
    retry: RetryPolicy,
    transport_failure_threshold: u32,
    jobs: Arc<RwLock<HashMap<JobId, Arc<JobHandle>>>>,
    confirmations: ConfirmationManager,
    resubmissions: ResubmissionHandler,
}

impl SubmissionCoordinator {
    /// Creates a coordinator over the given registry transport
    pub fn new(
        registry: Arc<dyn RegistryApi>,
        retry: RetryPolicy,
        transport_failure_threshold: u32,
    ) -> Self {
        Self {
            confirmations: ConfirmationManager::new(registry.clone()),
            resubmissions: ResubmissionHandler::new(registry.clone()),
            registry,
            retry,
            transport_failure_threshold,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a coordinator configured from the application configuration
    pub fn from_config(config: &VaxflowConfig, registry: Arc<dyn RegistryApi>) -> Self {
        Self::new(
            registry,
            RetryPolicy::from_config(&config.registry.retry),
            config.submission.transport_failure_threshold,
        )
    }

    /// Accepts a validated record set and starts dispatching it
    ///
    /// Plans the records into batches, creates the job, moves it to
    /// `Running` and spawns its sequential dispatch loop. Returns the job
    /// identifier for progress polling and per-record actions.
    pub async fn start(&self, records: &[Record], provider: ProviderId) -> Result<JobId> {
        let plan = plan_batches(records, &provider);
        let mut job = SubmissionJob::new(plan);
        job.apply_event(JobEvent::Start)?;

        let job_id = job.id.clone();
        crate::log_job_start!(job_id, provider, job.snapshot().total_batches);

        let handle = Arc::new(JobHandle::new(job));
        self.jobs.write().await.insert(job_id.clone(), handle.clone());

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_job(handle).await;
        });

        Ok(job_id)
    }

    /// Sequential dispatch loop for one job
    async fn run_job(&self, handle: Arc<JobHandle>) {
        loop {
            if handle.is_abandoned() {
                tracing::info!("Job abandoned, stopping dispatch");
                return;
            }

            let step = {
                let mut job = handle.job.lock().await;
                self.next_step(&mut job)
            };

            match step {
                DispatchStep::Submit {
                    batch,
                    provider,
                    correlation_id,
                } => {
                    self.dispatch_batch(&handle, batch, &provider, &correlation_id)
                        .await;
                }
                DispatchStep::Wait => handle.signal.notified().await,
                DispatchStep::Finished => return,
            }
        }
    }

    /// Decides the next step for the dispatch loop, under the job lock
    fn next_step(&self, job: &mut SubmissionJob) -> DispatchStep {
        match job.status() {
            JobStatus::Paused | JobStatus::Confirming | JobStatus::Idle => DispatchStep::Wait,
            JobStatus::Completed | JobStatus::Error => DispatchStep::Finished,
            JobStatus::Running => {
                if job.has_pending_confirmations() {
                    // Outcomes needing a human decision gate further
                    // dispatch until resolved or cancelled.
                    if let Err(e) = job.apply_event(JobEvent::ConfirmationPended) {
                        tracing::error!(error = %e, "Failed to enter confirming state");
                    }
                    return DispatchStep::Wait;
                }

                match job.next_batch() {
                    Some(batch) => DispatchStep::Submit {
                        batch: batch.clone(),
                        provider: job.provider.clone(),
                        correlation_id: job.correlation_id.clone(),
                    },
                    None => {
                        match job.apply_event(JobEvent::AllBatchesResolved) {
                            Ok(()) => {
                                let snapshot = job.snapshot();
                                crate::log_job_complete!(
                                    job.id,
                                    snapshot.successful_records,
                                    snapshot.failed_records
                                );
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to complete job");
                            }
                        }
                        DispatchStep::Finished
                    }
                }
            }
        }
    }

    /// Submits one batch through the retry policy and records its outcome
    async fn dispatch_batch(
        &self,
        handle: &JobHandle,
        batch: crate::core::planner::BatchPlan,
        provider: &ProviderId,
        correlation_id: &str,
    ) {
        crate::log_batch_dispatch!(batch.sequence, batch.record_count());

        let registry = self.registry.clone();
        let outcome = self
            .retry
            .run(|| {
                // Each wire request gets its own message identifier, so a
                // retried batch is a fresh request.
                let request = BatchSubmitRequest::for_batch(&batch, provider, correlation_id);
                let registry = registry.clone();
                async move { registry.submit_batch(&request).await }
            })
            .await
            .and_then(|response| parse_record_outcomes(&batch.row_map(), &response));

        let mut job = handle.job.lock().await;
        match outcome {
            Ok(outcomes) => {
                // The transition to confirming, if any outcome pended,
                // happens on the next loop iteration when it sees the queue.
                job.apply_batch_outcomes(outcomes);
                let snapshot = job.snapshot();
                tracing::info!(
                    batch_seq = batch.sequence,
                    completed = snapshot.completed_batches,
                    total = snapshot.total_batches,
                    successful = snapshot.successful_records,
                    failed = snapshot.failed_records,
                    "Batch resolved"
                );
            }
            Err(e) => {
                tracing::error!(batch_seq = batch.sequence, error = %e, "Batch failed");
                let consecutive = job.apply_batch_failure(&e);
                let transport = matches!(
                    &e,
                    VaxflowError::Registry(registry_err) if registry_err.is_transport()
                );
                if transport && consecutive >= self.transport_failure_threshold {
                    tracing::error!(
                        consecutive,
                        "Registry unreachable across consecutive batches, failing job"
                    );
                    if let Err(e) = job.apply_event(JobEvent::RegistryUnreachable) {
                        tracing::error!(error = %e, "Failed to fail job");
                    }
                }
            }
        }
    }

    /// Returns a progress snapshot for the job
    pub async fn progress(&self, job_id: &JobId) -> Result<ProgressSnapshot> {
        let handle = self.handle(job_id).await?;
        let job = handle.job.lock().await;
        Ok(job.snapshot())
    }

    /// Halts dispatch before the next batch
    ///
    /// An in-flight batch request is never cancelled mid-flight; its
    /// outcome is still recorded.
    pub async fn pause(&self, job_id: &JobId) -> Result<()> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.job.lock().await;
        job.apply_event(JobEvent::Pause)?;
        drop(job);
        handle.wake();
        tracing::info!(job_id = %job_id, "Job paused");
        Ok(())
    }

    /// Resumes dispatch after a pause
    pub async fn resume(&self, job_id: &JobId) -> Result<()> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.job.lock().await;
        job.apply_event(JobEvent::Resume)?;
        drop(job);
        handle.wake();
        tracing::info!(job_id = %job_id, "Job resumed");
        Ok(())
    }

    /// Confirms the given rows, sequentially
    pub async fn confirm(&self, job_id: &JobId, rows: &[usize]) -> Result<ConfirmationSummary> {
        let handle = self.handle(job_id).await?;
        self.confirmations.confirm(&handle, rows).await
    }

    /// Confirms every pending record, sequentially
    pub async fn confirm_all(&self, job_id: &JobId) -> Result<ConfirmationSummary> {
        let handle = self.handle(job_id).await?;
        self.confirmations.confirm_all(&handle).await
    }

    /// Clears the pending-confirmation queue without resolving records
    pub async fn cancel_confirmations(&self, job_id: &JobId) -> Result<usize> {
        let handle = self.handle(job_id).await?;
        self.confirmations.cancel(&handle).await
    }

    /// Resubmits one row with caller edits applied
    pub async fn resubmit(
        &self,
        job_id: &JobId,
        row: usize,
        edits: &EditedFields,
    ) -> Result<RecordResult> {
        let handle = self.handle(job_id).await?;
        self.resubmissions.resubmit(&handle, row, edits).await
    }

    /// All per-record outcomes recorded so far, in row order
    pub async fn results(&self, job_id: &JobId) -> Result<Vec<RecordResult>> {
        let handle = self.handle(job_id).await?;
        let job = handle.job.lock().await;
        Ok(job.results())
    }

    /// Builds the exportable report for the job
    pub async fn export(&self, job_id: &JobId) -> Result<SubmissionReport> {
        let handle = self.handle(job_id).await?;
        let job = handle.job.lock().await;
        Ok(SubmissionReport::for_job(&job))
    }

    /// Removes the job from the registry and stops its dispatch loop
    ///
    /// Completed and failed jobs are archived this way; a live job is
    /// abandoned in place (its in-flight batch still completes at the
    /// registry, per the no-mid-flight-cancellation rule).
    pub async fn abandon(&self, job_id: &JobId) -> Result<()> {
        let handle = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or_else(|| VaxflowError::Job(format!("unknown job {job_id}")))?;
        handle.abandon();
        tracing::info!(job_id = %job_id, "Job abandoned");
        Ok(())
    }

    /// Waits until the job reaches a state needing outside input
    ///
    /// Returns the first snapshot whose status is `Confirming`,
    /// `Completed` or `Error`. Intended for drivers that dispatch and then
    /// react, like the CLI.
    pub async fn wait_until_settled(&self, job_id: &JobId) -> Result<ProgressSnapshot> {
        let handle = self.handle(job_id).await?;
        loop {
            {
                let job = handle.job.lock().await;
                let status = job.status();
                if status.is_terminal() || status == JobStatus::Confirming {
                    return Ok(job.snapshot());
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    async fn handle(&self, job_id: &JobId) -> Result<Arc<JobHandle>> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| VaxflowError::Job(format!("unknown job {job_id}")))
    }
}
