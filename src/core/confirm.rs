//! Confirmation manager
//!
//! Drives the confirm-or-correct round-trip for records the registry
//! pended. Confirmations are processed sequentially, never in parallel,
//! because the registry expects per-record ordering. A record is never
//! dropped from the queue without resolution: a failed confirmation keeps
//! it queued with the registry's updated message.

use crate::adapters::registry::models::BatchSubmitRequest;
use crate::adapters::registry::{parse_record_outcomes, RegistryApi};
use crate::core::job::JobHandle;
use crate::domain::{Result, VaxflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregate result of a confirmation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationSummary {
    /// Records the registry accepted
    pub confirmed: usize,

    /// Records whose confirmation the registry rejected (still queued)
    pub failed: usize,

    /// Records skipped because they were already resolved
    pub skipped: usize,
}

/// Drives confirmation requests for pended records
#[derive(Clone)]
pub struct ConfirmationManager {
    registry: Arc<dyn RegistryApi>,
}

impl ConfirmationManager {
    /// Creates a manager over the given registry transport
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self { registry }
    }

    /// Confirms the given rows, sequentially and in order
    ///
    /// Already-resolved rows are skipped (idempotent no-op). A pended row
    /// without a claim reference cannot be confirmed, only corrected:
    /// the call is rejected at that row without side effects on it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown row or a row that cannot be
    /// confirmed.
    pub async fn confirm(&self, handle: &JobHandle, rows: &[usize]) -> Result<ConfirmationSummary> {
        let mut summary = ConfirmationSummary::default();

        for &row in rows {
            // Snapshot what the request needs, then release the lock for
            // the network round-trip.
            let (record, claim_id, claim_seq, provider, correlation_id) = {
                let mut job = handle.job.lock().await;

                let result = job
                    .result(row)
                    .ok_or_else(|| VaxflowError::Job(format!("no outcome recorded for row {row}")))?
                    .clone();

                if !result.needs_confirmation() {
                    tracing::debug!(row, "Skipping already-resolved record");
                    summary.skipped += 1;
                    continue;
                }
                if !result.can_confirm() {
                    return Err(VaxflowError::Confirmation(format!(
                        "row {row} has no claim reference and cannot be confirmed; correct and resubmit instead"
                    )));
                }

                let record = job
                    .record(row)
                    .ok_or_else(|| VaxflowError::Job(format!("no record stored for row {row}")))?
                    .clone();
                job.begin_row_action(row)?;

                (
                    record,
                    result.claim_id.clone().expect("checked by can_confirm"),
                    result.claim_sequence_number.expect("checked by can_confirm"),
                    job.provider.clone(),
                    job.correlation_id.clone(),
                )
            };

            let request = BatchSubmitRequest::for_confirmation(
                &record,
                &claim_id,
                claim_seq,
                true,
                &provider,
                &correlation_id,
            );

            tracing::info!(row, claim_id = %claim_id, "Confirming pended record");
            let response = self.registry.submit_confirmation(&request).await;

            let mut job = handle.job.lock().await;
            job.end_row_action(row);

            match response {
                Ok(response) => {
                    let row_map: HashMap<(u32, u32), usize> = [((1, 1), row)].into();
                    let outcome = parse_record_outcomes(&row_map, &response)?
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            VaxflowError::Registry(crate::domain::RegistryError::Protocol(
                                "empty confirmation response".to_string(),
                            ))
                        })?;

                    if outcome.needs_confirmation()
                        || outcome.status == crate::domain::OutcomeStatus::Error
                    {
                        tracing::warn!(
                            row,
                            status_code = %outcome.status_code,
                            "Confirmation rejected, record stays queued"
                        );
                        job.record_confirmation_failure(row, &outcome.status_code, &outcome.message);
                        summary.failed += 1;
                    } else {
                        job.resolve_confirmation(
                            row,
                            outcome.status,
                            &outcome.status_code,
                            &outcome.message,
                        );
                        summary.confirmed += 1;
                    }
                }
                Err(e) => {
                    // Transport-level failure: nothing from the registry to
                    // show, the record simply stays queued.
                    tracing::warn!(row, error = %e, "Confirmation request failed");
                    summary.failed += 1;
                }
            }

            job.drain_confirming_if_empty()?;
            drop(job);
            handle.wake();
        }

        Ok(summary)
    }

    /// Confirms every currently pending record, sequentially
    pub async fn confirm_all(&self, handle: &JobHandle) -> Result<ConfirmationSummary> {
        let rows = {
            let job = handle.job.lock().await;
            job.pending_rows()
        };
        tracing::info!(pending = rows.len(), "Confirming all pending records");
        self.confirm(handle, &rows).await
    }

    /// Clears the pending queue without resolving any record
    ///
    /// Records keep their pended outcomes and stay visible for manual
    /// correction. Idempotent: cancelling an empty queue is a no-op.
    pub async fn cancel(&self, handle: &JobHandle) -> Result<usize> {
        let mut job = handle.job.lock().await;
        let cleared = job.cancel_confirmations();
        job.drain_confirming_if_empty()?;
        drop(job);
        handle.wake();

        tracing::info!(cleared, "Cancelled pending confirmations");
        Ok(cleared)
    }
}
