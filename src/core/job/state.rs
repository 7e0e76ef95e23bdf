//! Submission job state machine
//!
//! Job state is an explicit enum with a pure transition function, kept
//! free of any presentation or I/O concern. The coordinator applies events
//! and stores the returned state; illegal transitions are errors, never
//! silent corrections.

use crate::domain::{Result, VaxflowError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a submission job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet started
    Idle,
    /// Dispatching batches
    Running,
    /// Dispatch halted before the next batch; in-flight work completes
    Paused,
    /// Waiting on confirm-or-correct decisions
    Confirming,
    /// All batches dispatched and resolved, no pending confirmations
    Completed,
    /// The registry could not be reached at all
    Error,
}

impl JobStatus {
    /// Whether the job has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Paused => write!(f, "paused"),
            JobStatus::Confirming => write!(f, "confirming"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Events that drive job state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    /// The job begins dispatching
    Start,
    /// Halt dispatch before the next batch
    Pause,
    /// Resume dispatch after a pause
    Resume,
    /// A batch outcome pended records for confirm-or-correct
    ConfirmationPended,
    /// Every pending confirmation was resolved or cancelled
    ConfirmationsDrained,
    /// All batches are dispatched and resolved with nothing pending
    AllBatchesResolved,
    /// Repeated transport failure: the registry is unreachable
    RegistryUnreachable,
}

impl JobStatus {
    /// Pure transition function
    ///
    /// # Errors
    ///
    /// Returns a state error when the event is not legal in the current
    /// state.
    pub fn transition(self, event: JobEvent) -> Result<JobStatus> {
        use JobEvent::*;
        use JobStatus::*;

        let next = match (self, event) {
            (Idle, Start) => Running,
            (Running, Pause) => Paused,
            (Paused, Resume) => Running,
            (Running, ConfirmationPended) => Confirming,
            (Confirming, ConfirmationsDrained) => Running,
            (Running, AllBatchesResolved) => Completed,
            (Running, RegistryUnreachable) => Error,
            (state, event) => {
                return Err(VaxflowError::State(format!(
                    "illegal transition: {state} + {event:?}"
                )))
            }
        };
        Ok(next)
    }
}
