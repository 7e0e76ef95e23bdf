//! Table-driven status-code classification
//!
//! The registry reports a status code per episode (and sometimes per
//! encounter or per batch). A fixed table maps each known code to an
//! outcome status and the follow-up action it demands. Unknown codes fall
//! back to a prefix rule so new registry codes degrade gracefully instead
//! of failing the parse.

use crate::domain::outcome::{ActionRequired, OutcomeStatus};

/// Classification of one registry status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeClassification {
    /// Outcome status the code maps to
    pub status: OutcomeStatus,

    /// Follow-up action the code demands
    pub action_required: ActionRequired,

    /// Whether the code signals a registry-side system fault (retryable)
    pub system_error: bool,
}

impl CodeClassification {
    const fn new(status: OutcomeStatus, action_required: ActionRequired) -> Self {
        Self {
            status,
            action_required,
            system_error: false,
        }
    }

    const fn system(status: OutcomeStatus) -> Self {
        Self {
            status,
            action_required: ActionRequired::None,
            system_error: true,
        }
    }
}

/// Fixed mapping from registry status codes to classifications
///
/// The table is the contract: adding a code here is the only change needed
/// when the registry starts emitting a new one.
const CODE_TABLE: &[(&str, CodeClassification)] = &[
    // Accepted outcomes
    (
        "AIR-S-0000",
        CodeClassification::new(OutcomeStatus::Success, ActionRequired::None),
    ),
    (
        "AIR-S-0001",
        CodeClassification::new(OutcomeStatus::Success, ActionRequired::None),
    ),
    // Pended outcomes awaiting confirm-or-correct
    (
        "AIR-W-1004",
        CodeClassification::new(OutcomeStatus::Warning, ActionRequired::ConfirmOrCorrect),
    ),
    (
        "AIR-W-1008",
        CodeClassification::new(OutcomeStatus::Warning, ActionRequired::ConfirmOrCorrect),
    ),
    (
        "AIR-W-1015",
        CodeClassification::new(OutcomeStatus::Warning, ActionRequired::ConfirmOrCorrect),
    ),
    // Informational warnings needing no action
    (
        "AIR-W-1022",
        CodeClassification::new(OutcomeStatus::Warning, ActionRequired::None),
    ),
    // Business-rule rejections
    (
        "AIR-E-1005",
        CodeClassification::new(OutcomeStatus::Error, ActionRequired::None),
    ),
    (
        "AIR-E-1012",
        CodeClassification::new(OutcomeStatus::Error, ActionRequired::None),
    ),
    (
        "AIR-E-1013",
        CodeClassification::new(OutcomeStatus::Error, ActionRequired::None),
    ),
    (
        "AIR-E-1019",
        CodeClassification::new(OutcomeStatus::Error, ActionRequired::None),
    ),
    // Registry system faults (retryable)
    ("AIR-E-9000", CodeClassification::system(OutcomeStatus::Error)),
    ("AIR-E-9001", CodeClassification::system(OutcomeStatus::Error)),
];

/// Classifies a registry status code
///
/// Unknown codes are classified by their severity prefix (`AIR-S-`,
/// `AIR-W-`, `AIR-E-`); anything unrecognisable is treated as an error
/// needing no automatic action.
pub fn classify(code: &str) -> CodeClassification {
    if let Some((_, classification)) = CODE_TABLE.iter().find(|(c, _)| *c == code) {
        return *classification;
    }

    if code.starts_with("AIR-S-") {
        CodeClassification::new(OutcomeStatus::Success, ActionRequired::None)
    } else if code.starts_with("AIR-W-") {
        CodeClassification::new(OutcomeStatus::Warning, ActionRequired::None)
    } else {
        CodeClassification::new(OutcomeStatus::Error, ActionRequired::None)
    }
}

/// Whether the code signals a registry-side system fault
pub fn is_system_error(code: &str) -> bool {
    classify(code).system_error
}
