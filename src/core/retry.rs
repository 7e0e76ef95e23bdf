//! Retry policy for batch submission
//!
//! Classifies failures as retryable or not and computes exponential
//! backoff. Only system errors (explicit registry system-error codes, or
//! transport-level faults) are retried; business-rule and validation
//! failures never are. Credential expiry is handled inside the registry
//! client with a single refresh-and-retry and does not consume the budget
//! here.

use crate::config::RetryConfig;
use crate::domain::{Result, VaxflowError};
use std::future::Future;
use std::time::Duration;

/// Exponential-backoff retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per operation, first try included
    pub max_attempts: usize,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Multiplier applied after each failed attempt
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Creates a policy from the retry configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.backoff_multiplier,
        }
    }

    /// Backoff delay before retry number `retry` (1-based)
    ///
    /// Doubles per retry under the default multiplier, capped at
    /// `max_delay`.
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let delay = self.base_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }

    /// Runs an operation under this policy
    ///
    /// Retries only errors classified retryable; anything else is returned
    /// immediately. After the budget is exhausted the last error is
    /// returned and the caller decides what the failure means (a failed
    /// batch never aborts the job).
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retryable = matches!(
                        &e,
                        VaxflowError::Registry(registry_err) if registry_err.is_retryable()
                    );
                    if !retryable || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for_retry(attempt);
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request after error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistryError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(2000));
        // Capped
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(3000));
        assert_eq!(policy.delay_for_retry(4), Duration::from_millis(3000));
    }

    #[test]
    fn test_delays_strictly_increase_until_cap() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for_retry(2) > policy.delay_for_retry(1));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = fast_policy(3);

        let result = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(RegistryError::ServerError {
                            status: 503,
                            message: "unavailable".to_string(),
                        }
                        .into())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = fast_policy(3);

        let result: Result<()> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RegistryError::SystemError {
                        code: "AIR-E-9000".to_string(),
                        message: "fault".to_string(),
                    }
                    .into())
                }
            })
            .await;

        assert!(result.is_err());
        // Exactly three attempts, never more
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_business_rule_error_never_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = fast_policy(3);

        let result: Result<()> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RegistryError::BusinessRule {
                        code: "AIR-E-1012".to_string(),
                        message: "Date is in the future.".to_string(),
                    }
                    .into())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_expiry_not_retried_here() {
        // The registry client owns the one-shot refresh; by the time an
        // auth expiry reaches the policy it is final.
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = fast_policy(3);

        let result: Result<()> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RegistryError::AuthExpired("stale".to_string()).into())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
