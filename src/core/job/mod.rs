//! Submission job aggregate
//!
//! A [`SubmissionJob`] holds everything one upload owns: the planned
//! batches, the per-row results, the pending-confirmation queue and the
//! progress counters. Counters are monotonic within a job; they are updated
//! atomically (under the job lock) after each batch resolves and are
//! visible to progress observers through [`ProgressSnapshot`].

pub mod monitor;
pub mod state;

pub use monitor::ProgressMonitor;
pub use state::{JobEvent, JobStatus};

use crate::core::planner::{BatchPlan, SubmissionPlan};
use crate::domain::ids::{JobId, ProviderId};
use crate::domain::outcome::{OutcomeStatus, RecordResult};
use crate::domain::record::Record;
use crate::domain::{Result, VaxflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

/// Status code used for records rejected locally before submission
pub const LOCAL_VALIDATION_CODE: &str = "LOCAL-VALIDATION";

/// Point-in-time view of a job's progress
///
/// The pending-confirmation list is a single top-level array, never nested
/// under a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Job the snapshot belongs to
    pub job_id: JobId,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Total batches planned for the job
    pub total_batches: usize,

    /// Batches dispatched and resolved so far
    pub completed_batches: usize,

    /// Records resolved successfully so far
    pub successful_records: usize,

    /// Records resolved as failed so far
    pub failed_records: usize,

    /// Records currently awaiting a confirm-or-correct decision
    pub pending_confirmation: Vec<RecordResult>,
}

/// One upload's worth of submission state
#[derive(Debug)]
pub struct SubmissionJob {
    /// Job identifier
    pub id: JobId,

    /// Submitting provider
    pub provider: ProviderId,

    /// Correlation identifier, constant across every request of this job
    pub correlation_id: String,

    /// Lifecycle state
    status: JobStatus,

    /// Planned batches in dispatch order
    batches: Vec<BatchPlan>,

    /// Index of the next batch to dispatch
    next_batch: usize,

    /// Current record version per row (replaced on resubmission)
    records: BTreeMap<usize, Record>,

    /// Per-row outcomes
    results: BTreeMap<usize, RecordResult>,

    /// Rows awaiting a confirm-or-correct decision, in arrival order
    pending_confirmation: Vec<usize>,

    /// Rows with a confirmation or resubmission currently in flight
    rows_in_flight: HashSet<usize>,

    /// Rows already counted towards `successful_records`
    counted_success: HashSet<usize>,

    /// Rows already counted towards `failed_records`
    counted_failed: HashSet<usize>,

    total_batches: usize,
    completed_batches: usize,
    successful_records: usize,
    failed_records: usize,

    /// Consecutive batches lost to transport failures
    consecutive_transport_failures: u32,

    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl SubmissionJob {
    /// Creates a job from a submission plan
    ///
    /// Records the planner rejected are settled immediately as local
    /// validation failures so result reporting covers every source row.
    pub fn new(plan: SubmissionPlan) -> Self {
        let total_batches = plan.batches.len();

        let mut records = BTreeMap::new();
        for batch in &plan.batches {
            for encounter in &batch.encounters {
                for episode in &encounter.episodes {
                    records.insert(episode.row_number, episode.record.clone());
                }
            }
        }

        let mut results = BTreeMap::new();
        let mut counted_failed = HashSet::new();
        let mut failed_records = 0;
        for rejection in &plan.rejected {
            let mut outcome = RecordResult::settled(
                rejection.row_number,
                OutcomeStatus::Error,
                LOCAL_VALIDATION_CODE,
                rejection.message.clone(),
            );
            outcome.field_errors = rejection.field_errors.clone();
            results.insert(rejection.row_number, outcome);
            counted_failed.insert(rejection.row_number);
            failed_records += 1;
        }

        Self {
            id: JobId::generate(),
            provider: plan.provider,
            correlation_id: Uuid::new_v4().to_string(),
            status: JobStatus::Idle,
            batches: plan.batches,
            next_batch: 0,
            records,
            results,
            pending_confirmation: Vec::new(),
            rows_in_flight: HashSet::new(),
            counted_success: HashSet::new(),
            counted_failed,
            total_batches,
            completed_batches: 0,
            successful_records: 0,
            failed_records,
            consecutive_transport_failures: 0,
            created_at: Utc::now(),
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Applies a state-machine event
    pub fn apply_event(&mut self, event: JobEvent) -> Result<()> {
        self.status = self.status.transition(event)?;
        tracing::debug!(job_id = %self.id, status = %self.status, "Job state changed");
        Ok(())
    }

    /// Next batch to dispatch, if any remain
    pub fn next_batch(&self) -> Option<&BatchPlan> {
        self.batches.get(self.next_batch)
    }

    /// Whether any rows await a confirm-or-correct decision
    pub fn has_pending_confirmations(&self) -> bool {
        !self.pending_confirmation.is_empty()
    }

    /// Rows pending confirmation, in queue order
    pub fn pending_rows(&self) -> Vec<usize> {
        self.pending_confirmation.clone()
    }

    /// Consecutive batches lost to transport failures
    pub fn consecutive_transport_failures(&self) -> u32 {
        self.consecutive_transport_failures
    }

    /// Current record version for a row
    pub fn record(&self, row: usize) -> Option<&Record> {
        self.records.get(&row)
    }

    /// Outcome for a row, if one has been recorded
    pub fn result(&self, row: usize) -> Option<&RecordResult> {
        self.results.get(&row)
    }

    /// All outcomes recorded so far, in row order
    pub fn results(&self) -> Vec<RecordResult> {
        self.results.values().cloned().collect()
    }

    /// Marks a per-row action (confirmation or resubmission) as in flight
    ///
    /// Two concurrent submission attempts for the same row are never
    /// allowed; the second caller is rejected until the first completes.
    pub fn begin_row_action(&mut self, row: usize) -> Result<()> {
        if !self.rows_in_flight.insert(row) {
            return Err(VaxflowError::Job(format!(
                "an action for row {row} is already in flight"
            )));
        }
        Ok(())
    }

    /// Releases the per-row action guard
    pub fn end_row_action(&mut self, row: usize) {
        self.rows_in_flight.remove(&row);
    }

    /// Records the outcomes of a successfully submitted batch
    ///
    /// Returns `true` when any outcome pended a record for
    /// confirm-or-correct.
    pub fn apply_batch_outcomes(&mut self, outcomes: Vec<RecordResult>) -> bool {
        let mut any_pended = false;

        for outcome in outcomes {
            let row = outcome.row_number;
            if outcome.needs_confirmation() {
                any_pended = true;
                if !self.pending_confirmation.contains(&row) {
                    self.pending_confirmation.push(row);
                }
            } else {
                self.count_resolution(row, outcome.status);
            }
            self.results.insert(row, outcome);
        }

        self.completed_batches += 1;
        self.next_batch += 1;
        self.consecutive_transport_failures = 0;
        any_pended
    }

    /// Settles every record of the current batch as failed
    ///
    /// Called when the retry budget is exhausted. The job carries on with
    /// the next batch; only repeated transport failure across batches moves
    /// the job to the error state (tracked by the returned counter).
    pub fn apply_batch_failure(&mut self, error: &VaxflowError) -> u32 {
        let (code, message, transport) = match error {
            VaxflowError::Registry(e) => (
                match e {
                    crate::domain::RegistryError::SystemError { code, .. } => code.clone(),
                    _ => "REGISTRY-FAILURE".to_string(),
                },
                e.to_string(),
                e.is_transport(),
            ),
            other => ("REGISTRY-FAILURE".to_string(), other.to_string(), false),
        };

        let rows = match self.batches.get(self.next_batch) {
            Some(batch) => batch.rows(),
            None => Vec::new(),
        };
        for row in rows {
            let outcome =
                RecordResult::settled(row, OutcomeStatus::Error, code.clone(), message.clone());
            self.results.insert(row, outcome);
            self.count_resolution(row, OutcomeStatus::Error);
        }

        self.completed_batches += 1;
        self.next_batch += 1;
        if transport {
            self.consecutive_transport_failures += 1;
        } else {
            self.consecutive_transport_failures = 0;
        }
        self.consecutive_transport_failures
    }

    /// Resolves a pending confirmation with the registry's response
    pub fn resolve_confirmation(
        &mut self,
        row: usize,
        status: OutcomeStatus,
        status_code: &str,
        message: &str,
    ) {
        if let Some(result) = self.results.get_mut(&row) {
            result.resolve_confirmed(status, status_code, message);
        }
        self.pending_confirmation.retain(|&r| r != row);
        self.count_resolution(row, status);
    }

    /// Records a failed confirmation attempt, keeping the row queued
    ///
    /// The record is never dropped without resolution; the registry's new
    /// message replaces the stored one verbatim.
    pub fn record_confirmation_failure(&mut self, row: usize, status_code: &str, message: &str) {
        if let Some(result) = self.results.get_mut(&row) {
            result.status_code = status_code.to_string();
            result.message = message.to_string();
        }
    }

    /// Clears the pending queue without resolving records
    ///
    /// The records keep their pended outcomes and stay visible for manual
    /// correction. Returns the number of rows cleared.
    pub fn cancel_confirmations(&mut self) -> usize {
        let cleared = self.pending_confirmation.len();
        self.pending_confirmation.clear();
        cleared
    }

    /// Applies a resubmission outcome, replacing the row's result in place
    pub fn apply_resubmission(&mut self, row: usize, outcome: RecordResult, new_version: Record) {
        let pended = outcome.needs_confirmation();
        let status = outcome.status;

        match self.results.get_mut(&row) {
            Some(result) => result.replace_with(outcome),
            None => {
                self.results.insert(row, outcome);
            }
        }
        self.records.insert(row, new_version);

        if pended {
            if !self.pending_confirmation.contains(&row) {
                self.pending_confirmation.push(row);
            }
        } else {
            self.pending_confirmation.retain(|&r| r != row);
            self.count_resolution(row, status);
        }
    }

    /// Counts a resubmission attempt that failed before an outcome existed
    ///
    /// The attempt was made, so `resubmit_count` still increments.
    pub fn record_resubmission_attempt(&mut self, row: usize) {
        if let Some(result) = self.results.get_mut(&row) {
            result.resubmit_count += 1;
        }
    }

    /// Transitions out of `Confirming` once the queue is empty
    pub fn drain_confirming_if_empty(&mut self) -> Result<bool> {
        if self.status == JobStatus::Confirming && self.pending_confirmation.is_empty() {
            self.apply_event(JobEvent::ConfirmationsDrained)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Builds a progress snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            job_id: self.id.clone(),
            status: self.status,
            total_batches: self.total_batches,
            completed_batches: self.completed_batches,
            successful_records: self.successful_records,
            failed_records: self.failed_records,
            pending_confirmation: self
                .pending_confirmation
                .iter()
                .filter_map(|row| self.results.get(row).cloned())
                .collect(),
        }
    }

    // Counters are monotonic: a row is counted at most once per bucket,
    // at resolution time.
    fn count_resolution(&mut self, row: usize, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Success | OutcomeStatus::Warning => {
                if self.counted_success.insert(row) {
                    self.successful_records += 1;
                }
            }
            OutcomeStatus::Error => {
                if self.counted_failed.insert(row) {
                    self.failed_records += 1;
                }
            }
        }
    }
}

/// Shared handle to one job: the job state behind a lock, plus the signal
/// that wakes the dispatch loop after pause/resume/confirmation changes
#[derive(Debug)]
pub struct JobHandle {
    /// The job, serialized behind an async lock
    pub job: Mutex<SubmissionJob>,

    /// Wakes the dispatch loop when job state changes
    pub signal: Notify,

    /// Set when the job is explicitly abandoned; the dispatch loop exits
    abandoned: std::sync::atomic::AtomicBool,
}

impl JobHandle {
    /// Wraps a job in a shared handle
    pub fn new(job: SubmissionJob) -> Self {
        Self {
            job: Mutex::new(job),
            signal: Notify::new(),
            abandoned: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Wakes the dispatch loop
    pub fn wake(&self) {
        self.signal.notify_one();
    }

    /// Marks the job abandoned and wakes the dispatch loop to exit
    pub fn abandon(&self) {
        self.abandoned
            .store(true, std::sync::atomic::Ordering::SeqCst);
        self.wake();
    }

    /// Whether the job was explicitly abandoned
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planner::plan_batches;
    use crate::domain::ids::ClaimId;
    use crate::domain::record::test_support::record;
    use std::str::FromStr;

    fn job_for(count: usize) -> SubmissionJob {
        let records: Vec<_> = (1..=count)
            .map(|i| record(i, &format!("Given{i}"), "2025-06-01"))
            .collect();
        let provider = ProviderId::new("2447051W").unwrap();
        SubmissionJob::new(plan_batches(&records, &provider))
    }

    fn pended(row: usize) -> RecordResult {
        RecordResult::pended(
            row,
            OutcomeStatus::Warning,
            "AIR-W-1004",
            "Individual not found on the register.",
            ClaimId::from_str("WCH4521-7").unwrap(),
            1,
        )
    }

    #[test]
    fn test_new_job_counts_local_rejections() {
        let mut bad = record(2, "Jane", "2025-06-01");
        bad.vaccination.vaccine_code = String::new();
        let records = vec![record(1, "Amy", "2025-06-01"), bad];
        let provider = ProviderId::new("2447051W").unwrap();
        let job = SubmissionJob::new(plan_batches(&records, &provider));

        let snapshot = job.snapshot();
        assert_eq!(snapshot.failed_records, 1);
        assert_eq!(snapshot.total_batches, 1);
        assert_eq!(job.result(2).unwrap().status_code, LOCAL_VALIDATION_CODE);
    }

    #[test]
    fn test_apply_batch_outcomes_updates_counters() {
        let mut job = job_for(3);
        job.apply_event(JobEvent::Start).unwrap();

        let any_pended = job.apply_batch_outcomes(vec![
            RecordResult::settled(1, OutcomeStatus::Success, "AIR-S-0000", "Accepted."),
            pended(2),
            RecordResult::settled(3, OutcomeStatus::Error, "AIR-E-1012", "Date is in the future."),
        ]);

        assert!(any_pended);
        let snapshot = job.snapshot();
        assert_eq!(snapshot.completed_batches, 1);
        assert_eq!(snapshot.successful_records, 1);
        assert_eq!(snapshot.failed_records, 1);
        assert_eq!(snapshot.pending_confirmation.len(), 1);
        assert_eq!(snapshot.pending_confirmation[0].row_number, 2);
        assert_eq!(
            job.result(3).unwrap().message,
            "Date is in the future."
        );
    }

    #[test]
    fn test_counters_never_decrease() {
        let mut job = job_for(2);
        job.apply_event(JobEvent::Start).unwrap();
        job.apply_batch_outcomes(vec![
            RecordResult::settled(1, OutcomeStatus::Success, "AIR-S-0000", "Accepted."),
            RecordResult::settled(2, OutcomeStatus::Error, "AIR-E-1012", "Date is in the future."),
        ]);

        let before = job.snapshot();

        // A later resubmission success for row 2 adds to successes without
        // rolling back the failure count.
        let fixed = RecordResult::settled(2, OutcomeStatus::Success, "AIR-S-0000", "Accepted.");
        let new_version = job.record(2).unwrap().clone();
        job.apply_resubmission(2, fixed, new_version);

        let after = job.snapshot();
        assert!(after.successful_records >= before.successful_records);
        assert!(after.failed_records >= before.failed_records);
        assert_eq!(after.successful_records, 2);
        assert_eq!(job.result(2).unwrap().resubmit_count, 1);
    }

    #[test]
    fn test_batch_failure_settles_rows_and_tracks_transport() {
        let mut job = job_for(2);
        job.apply_event(JobEvent::Start).unwrap();

        let err = VaxflowError::Registry(crate::domain::RegistryError::ConnectionFailed(
            "connection refused".to_string(),
        ));
        let consecutive = job.apply_batch_failure(&err);

        assert_eq!(consecutive, 1);
        let snapshot = job.snapshot();
        assert_eq!(snapshot.completed_batches, 1);
        assert_eq!(snapshot.failed_records, 2);
        assert!(job.result(1).unwrap().message.contains("connection refused"));
    }

    #[test]
    fn test_transport_failure_counter_resets_on_success() {
        let mut job = job_for(11); // two batches
        job.apply_event(JobEvent::Start).unwrap();

        let err = VaxflowError::Registry(crate::domain::RegistryError::Timeout(
            "30s".to_string(),
        ));
        assert_eq!(job.apply_batch_failure(&err), 1);

        let outcomes = vec![RecordResult::settled(
            11,
            OutcomeStatus::Success,
            "AIR-S-0000",
            "Accepted.",
        )];
        job.apply_batch_outcomes(outcomes);
        assert_eq!(job.consecutive_transport_failures(), 0);
    }

    #[test]
    fn test_confirmation_resolution_and_drain() {
        let mut job = job_for(1);
        job.apply_event(JobEvent::Start).unwrap();
        job.apply_batch_outcomes(vec![pended(1)]);
        job.apply_event(JobEvent::ConfirmationPended).unwrap();

        job.resolve_confirmation(1, OutcomeStatus::Success, "AIR-S-0001", "Accepted as submitted.");
        assert!(!job.has_pending_confirmations());
        assert!(job.result(1).unwrap().claim_id.is_none());

        assert!(job.drain_confirming_if_empty().unwrap());
        assert_eq!(job.status(), JobStatus::Running);
        assert_eq!(job.snapshot().successful_records, 1);
    }

    #[test]
    fn test_cancel_keeps_records_visible() {
        let mut job = job_for(2);
        job.apply_event(JobEvent::Start).unwrap();
        job.apply_batch_outcomes(vec![pended(1), pended(2)]);

        assert_eq!(job.cancel_confirmations(), 2);
        assert!(!job.has_pending_confirmations());
        // Outcomes untouched: still pended, still carrying their claim
        assert!(job.result(1).unwrap().needs_confirmation());
        assert!(job.result(2).unwrap().claim_id.is_some());
    }

    #[test]
    fn test_row_action_guard() {
        let mut job = job_for(1);
        job.begin_row_action(1).unwrap();
        assert!(job.begin_row_action(1).is_err());
        job.end_row_action(1);
        assert!(job.begin_row_action(1).is_ok());
    }

    #[test]
    fn test_failed_resubmission_attempt_still_counts() {
        let mut job = job_for(1);
        job.apply_event(JobEvent::Start).unwrap();
        job.apply_batch_outcomes(vec![RecordResult::settled(
            1,
            OutcomeStatus::Error,
            "AIR-E-1012",
            "Date is in the future.",
        )]);

        job.record_resubmission_attempt(1);
        assert_eq!(job.result(1).unwrap().resubmit_count, 1);
        // Message untouched
        assert_eq!(job.result(1).unwrap().message, "Date is in the future.");
    }
}
