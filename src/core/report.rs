//! Submission report export
//!
//! Serializable per-job report handed to the calling layer: totals plus
//! one row per recorded outcome, registry messages verbatim.

use crate::core::job::{JobStatus, SubmissionJob};
use crate::domain::ids::{JobId, ProviderId};
use crate::domain::outcome::{ActionRequired, FieldError, OutcomeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    /// Source row number
    pub row_number: usize,

    /// Outcome status
    pub status: OutcomeStatus,

    /// Registry status code
    pub status_code: String,

    /// Registry message, byte-for-byte as received
    pub message: String,

    /// Follow-up action still outstanding
    pub action_required: ActionRequired,

    /// Claim reference while a confirmation is outstanding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,

    /// Field-level errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,

    /// Resubmission attempts made for this row
    pub resubmit_count: u32,
}

/// Aggregate totals of a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTotals {
    /// Rows with a recorded outcome
    pub total_records: usize,

    /// Batches planned for the job
    pub total_batches: usize,

    /// Batches dispatched and resolved
    pub completed_batches: usize,

    /// Records resolved successfully
    pub successful_records: usize,

    /// Records resolved as failed
    pub failed_records: usize,

    /// Records still awaiting a confirm-or-correct decision
    pub pending_confirmation: usize,
}

/// Exportable snapshot of one submission job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// Job the report covers
    pub job_id: JobId,

    /// Submitting provider
    pub provider: ProviderId,

    /// Job state at export time
    pub status: JobStatus,

    /// When the report was generated
    pub generated_at: DateTime<Utc>,

    /// Aggregate totals
    pub totals: ReportTotals,

    /// Per-row outcomes in row order
    pub rows: Vec<ReportRow>,
}

impl SubmissionReport {
    /// Builds a report from the job's current state
    pub fn for_job(job: &SubmissionJob) -> Self {
        let snapshot = job.snapshot();
        let rows: Vec<ReportRow> = job
            .results()
            .into_iter()
            .map(|outcome| ReportRow {
                row_number: outcome.row_number,
                status: outcome.status,
                status_code: outcome.status_code,
                message: outcome.message,
                action_required: outcome.action_required,
                claim_id: outcome.claim_id.map(|c| c.as_str().to_string()),
                field_errors: outcome.field_errors,
                resubmit_count: outcome.resubmit_count,
            })
            .collect();

        Self {
            job_id: snapshot.job_id,
            provider: job.provider.clone(),
            status: snapshot.status,
            generated_at: Utc::now(),
            totals: ReportTotals {
                total_records: rows.len(),
                total_batches: snapshot.total_batches,
                completed_batches: snapshot.completed_batches,
                successful_records: snapshot.successful_records,
                failed_records: snapshot.failed_records,
                pending_confirmation: snapshot.pending_confirmation.len(),
            },
            rows,
        }
    }

    /// Logs the report totals
    pub fn log_summary(&self) {
        tracing::info!(
            job_id = %self.job_id,
            status = %self.status,
            total_records = self.totals.total_records,
            successful = self.totals.successful_records,
            failed = self.totals.failed_records,
            pending_confirmation = self.totals.pending_confirmation,
            "Submission report"
        );
    }
}
