//! Resubmission handler
//!
//! The "correct" path of confirm-or-correct: applies caller edits to one
//! record, validates the edited version with the same structural rules the
//! planner enforces, and submits it as a fresh single-record request with
//! its own message identifier. The new outcome replaces the old one in
//! place and `resubmit_count` increments by exactly one per attempt, win or
//! lose.

use crate::adapters::registry::models::BatchSubmitRequest;
use crate::adapters::registry::{parse_record_outcomes, RegistryApi};
use crate::core::job::JobHandle;
use crate::domain::outcome::RecordResult;
use crate::domain::record::EditedFields;
use crate::domain::{Result, VaxflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Submits corrected records outside their original batch
#[derive(Clone)]
pub struct ResubmissionHandler {
    registry: Arc<dyn RegistryApi>,
}

impl ResubmissionHandler {
    /// Creates a handler over the given registry transport
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self { registry }
    }

    /// Resubmits one row with the caller's edits applied
    ///
    /// Returns the row's updated outcome. Local validation failures reject
    /// the edit before anything is sent, without consuming a resubmission
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is unknown, has no prior outcome, fails
    /// structural validation, or the registry cannot be reached.
    pub async fn resubmit(
        &self,
        handle: &JobHandle,
        row: usize,
        edits: &EditedFields,
    ) -> Result<RecordResult> {
        let (record, provider, correlation_id) = {
            let mut job = handle.job.lock().await;

            if job.result(row).is_none() {
                return Err(VaxflowError::Job(format!(
                    "row {row} has no submission outcome to correct"
                )));
            }
            let record = job
                .record(row)
                .ok_or_else(|| VaxflowError::Job(format!("no record stored for row {row}")))?
                .clone();
            job.begin_row_action(row)?;

            (record, job.provider.clone(), job.correlation_id.clone())
        };

        // Edits produce a new record version; the original stays untouched
        // until the attempt is actually made.
        let new_version = record.apply_edits(edits);
        if let Err(e) = new_version.validate() {
            let mut job = handle.job.lock().await;
            job.end_row_action(row);
            return Err(e.into());
        }

        let request = BatchSubmitRequest::for_single(&new_version, &provider, &correlation_id);
        tracing::info!(row, message_id = %request.message_id, "Resubmitting corrected record");

        let response = self.registry.submit_batch(&request).await;

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
                            "empty resubmission response".to_string(),
                        ))
                    })?;

                job.apply_resubmission(row, outcome, new_version);
                job.drain_confirming_if_empty()?;
                let updated = job
                    .result(row)
                    .cloned()
                    .expect("outcome was just recorded");
                drop(job);
                handle.wake();

                Ok(updated)
            }
            Err(e) => {
                // The attempt was made; it still counts.
                job.record_resubmission_attempt(row);
                tracing::warn!(row, error = %e, "Resubmission request failed");
                Err(e)
            }
        }
    }
}
