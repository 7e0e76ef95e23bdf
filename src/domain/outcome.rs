//! Per-record submission outcomes
//!
//! The registry reports results at mixed granularity; the protocol client
//! flattens them into one [`RecordResult`] per source row. The registry's
//! message text is stored byte-for-byte — downstream consumers are
//! contractually required to show it unmodified.

use crate::domain::ids::ClaimId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome status reported by the registry for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "SUCCESS"),
            OutcomeStatus::Warning => write!(f, "WARNING"),
            OutcomeStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Follow-up action the registry expects from the submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionRequired {
    /// Nothing further; the record is settled
    None,
    /// The submitter must either accept the record as-is or resubmit
    /// corrected data
    ConfirmOrCorrect,
}

/// Field-level error detail attached to a record outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field the error refers to
    pub field: String,

    /// Registry error code, when one was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Error message
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Sets the registry error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Outcome of submitting one record
///
/// Invariant: `claim_id` is present only while a confirm-or-correct decision
/// is outstanding for the record (`action_required` is `ConfirmOrCorrect`),
/// or when the registry echoes a still-unresolved prior confirmation
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    /// Source row this outcome maps back to
    pub row_number: usize,

    /// Outcome status
    pub status: OutcomeStatus,

    /// Registry-issued status code
    pub status_code: String,

    /// Registry message text, stored and reproduced byte-for-byte
    pub message: String,

    /// Registry claim reference for a pended outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<ClaimId>,

    /// Claim sequence number paired with `claim_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_sequence_number: Option<u32>,

    /// Follow-up action the registry expects
    pub action_required: ActionRequired,

    /// Field-level error details
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,

    /// Number of resubmission attempts made for this row, win or lose
    #[serde(default)]
    pub resubmit_count: u32,
}

impl RecordResult {
    /// Creates a settled outcome with no follow-up action
    pub fn settled(
        row_number: usize,
        status: OutcomeStatus,
        status_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            status,
            status_code: status_code.into(),
            message: message.into(),
            claim_id: None,
            claim_sequence_number: None,
            action_required: ActionRequired::None,
            field_errors: Vec::new(),
            resubmit_count: 0,
        }
    }

    /// Creates a pended outcome awaiting a confirm-or-correct decision
    pub fn pended(
        row_number: usize,
        status: OutcomeStatus,
        status_code: impl Into<String>,
        message: impl Into<String>,
        claim_id: ClaimId,
        claim_sequence_number: u32,
    ) -> Self {
        Self {
            row_number,
            status,
            status_code: status_code.into(),
            message: message.into(),
            claim_id: Some(claim_id),
            claim_sequence_number: Some(claim_sequence_number),
            action_required: ActionRequired::ConfirmOrCorrect,
            field_errors: Vec::new(),
            resubmit_count: 0,
        }
    }

    /// Whether the record is waiting on a confirm-or-correct decision
    pub fn needs_confirmation(&self) -> bool {
        self.action_required == ActionRequired::ConfirmOrCorrect
    }

    /// Whether a confirmation request can be issued for this outcome
    ///
    /// A pended outcome without a claim reference cannot be confirmed, only
    /// corrected through resubmission.
    pub fn can_confirm(&self) -> bool {
        self.needs_confirmation()
            && self.claim_id.is_some()
            && self.claim_sequence_number.is_some()
    }

    /// Marks the outstanding confirmation as accepted by the registry
    ///
    /// Clears the claim reference and follow-up action; status, code and
    /// message are replaced with the confirmation response's values.
    pub fn resolve_confirmed(
        &mut self,
        status: OutcomeStatus,
        status_code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.status = status;
        self.status_code = status_code.into();
        self.message = message.into();
        self.claim_id = None;
        self.claim_sequence_number = None;
        self.action_required = ActionRequired::None;
    }

    /// Replaces this outcome with a resubmission's result, in place
    ///
    /// Status, code, message, claim reference and field errors all take the
    /// new outcome's values; `resubmit_count` increments by exactly one
    /// regardless of whether the resubmission succeeded.
    pub fn replace_with(&mut self, outcome: RecordResult) {
        debug_assert_eq!(self.row_number, outcome.row_number);
        self.status = outcome.status;
        self.status_code = outcome.status_code;
        self.message = outcome.message;
        self.claim_id = outcome.claim_id;
        self.claim_sequence_number = outcome.claim_sequence_number;
        self.action_required = outcome.action_required;
        self.field_errors = outcome.field_errors;
        self.resubmit_count += 1;
    }

    /// Checks the claim-reference invariant
    pub fn claim_reference_consistent(&self) -> bool {
        match self.action_required {
            ActionRequired::ConfirmOrCorrect => true,
            // A claim reference may linger only while a prior confirmation
            // request is still unresolved; a settled record must not carry one.
            ActionRequired::None => self.claim_id.is_none() || self.claim_sequence_number.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pended_warning(row: usize) -> RecordResult {
        RecordResult::pended(
            row,
            OutcomeStatus::Warning,
            "AIR-W-1004",
            "Individual not found on the register. Confirm details are correct.",
            ClaimId::from_str("WCH4521-7").unwrap(),
            1,
        )
    }

    #[test]
    fn test_settled_outcome_has_no_claim() {
        let outcome = RecordResult::settled(1, OutcomeStatus::Success, "AIR-S-0000", "Accepted.");
        assert!(!outcome.needs_confirmation());
        assert!(!outcome.can_confirm());
        assert!(outcome.claim_id.is_none());
        assert!(outcome.claim_reference_consistent());
    }

    #[test]
    fn test_pended_outcome_can_confirm() {
        let outcome = pended_warning(2);
        assert!(outcome.needs_confirmation());
        assert!(outcome.can_confirm());
        assert!(outcome.claim_reference_consistent());
    }

    #[test]
    fn test_warning_without_claim_cannot_confirm() {
        let mut outcome = pended_warning(2);
        outcome.claim_id = None;
        outcome.claim_sequence_number = None;
        assert!(outcome.needs_confirmation());
        assert!(!outcome.can_confirm());
    }

    #[test]
    fn test_resolve_confirmed_clears_claim() {
        let mut outcome = pended_warning(2);
        outcome.resolve_confirmed(OutcomeStatus::Success, "AIR-S-0001", "Accepted as submitted.");

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.message, "Accepted as submitted.");
        assert!(outcome.claim_id.is_none());
        assert!(!outcome.needs_confirmation());
        assert_eq!(outcome.resubmit_count, 0);
    }

    #[test]
    fn test_replace_with_increments_resubmit_count() {
        let mut outcome = RecordResult::settled(
            3,
            OutcomeStatus::Error,
            "AIR-E-1012",
            "Date is in the future.",
        );

        // Resubmission comes back with the identical error
        let retry = RecordResult::settled(
            3,
            OutcomeStatus::Error,
            "AIR-E-1012",
            "Date is in the future.",
        );
        outcome.replace_with(retry.clone());
        assert_eq!(outcome.resubmit_count, 1);
        assert_eq!(outcome.message, "Date is in the future.");

        outcome.replace_with(retry);
        assert_eq!(outcome.resubmit_count, 2);
    }

    #[test]
    fn test_message_preserved_byte_for_byte() {
        let message = "  Date  of service precedes date of birth.\t";
        let outcome = RecordResult::settled(4, OutcomeStatus::Error, "AIR-E-1013", message);
        assert_eq!(outcome.message, message);

        let json = serde_json::to_string(&outcome).unwrap();
        let back: RecordResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, message);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OutcomeStatus::Success.to_string(), "SUCCESS");
        assert_eq!(OutcomeStatus::Warning.to_string(), "WARNING");
        assert_eq!(OutcomeStatus::Error.to_string(), "ERROR");
    }
}
