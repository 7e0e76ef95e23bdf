//! Progress polling with bounded failure tolerance
//!
//! Progress is observed by polling snapshots. A single failed poll is
//! transient (the observer keeps the last good snapshot); only a run of
//! consecutive failures surfaces a connectivity error.

use crate::domain::{Result, VaxflowError};

/// Tracks consecutive poll failures against a tolerance
#[derive(Debug)]
pub struct ProgressMonitor {
    tolerance: u32,
    consecutive_failures: u32,
}

impl ProgressMonitor {
    /// Creates a monitor tolerating the given number of consecutive
    /// failed polls
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            consecutive_failures: 0,
        }
    }

    /// Feeds one poll result through the monitor
    ///
    /// Returns `Ok(Some(value))` for a successful poll, `Ok(None)` for a
    /// tolerated transient failure, and an error once the tolerance is
    /// exceeded.
    pub fn observe<T>(&mut self, poll: Result<T>) -> Result<Option<T>> {
        match poll {
            Ok(value) => {
                self.consecutive_failures = 0;
                Ok(Some(value))
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.tolerance {
                    Err(VaxflowError::Registry(
                        crate::domain::RegistryError::ConnectionFailed(format!(
                            "{} consecutive failed progress polls, last error: {e}",
                            self.consecutive_failures
                        )),
                    ))
                } else {
                    tracing::debug!(
                        consecutive = self.consecutive_failures,
                        tolerance = self.tolerance,
                        error = %e,
                        "Tolerating failed progress poll"
                    );
                    Ok(None)
                }
            }
        }
    }

    /// Consecutive failures observed so far
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
