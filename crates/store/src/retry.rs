//! Exponential backoff for transient concurrency conflicts.

use std::future::Future;
use std::time::Duration;

use centavo_core::ledger::LedgerError;
use centavo_shared::config::{RetryConfig, SyncConfig};

/// Exponential backoff schedule: `base * 2^(attempt-1)`, capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// Builds the processor's policy from configuration.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Builds the reconciler's policy from sync configuration.
    #[must_use]
    pub fn for_sync(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Maximum number of attempts before failing visibly.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay to sleep after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let ms = self
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Runs an operation, retrying transient failures with backoff.
///
/// Only errors with `is_retryable()` are retried; everything else propagates
/// immediately. The final attempt's error propagates when retries run out.
///
/// # Errors
///
/// Returns the operation's error once it is non-retryable or attempts are
/// exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut run: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 1_u32;
    loop {
        match run().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(operation, attempt, delay = ?delay, "transient conflict, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts,
            base_delay_ms: 50,
            max_delay_ms: 1_000,
        })
    }

    #[test]
    fn test_delay_schedule_doubles_and_caps() {
        let p = policy(10);
        assert_eq!(p.delay_for(1), Duration::from_millis(50));
        assert_eq!(p.delay_for(2), Duration::from_millis(100));
        assert_eq!(p.delay_for(3), Duration::from_millis(200));
        assert_eq!(p.delay_for(8), Duration::from_millis(1_000));
        assert_eq!(p.delay_for(60), Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&policy(3), "test", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LedgerError::ConcurrencyConflict)
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_conflict() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), LedgerError> = with_retry(&policy(3), "test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::ConcurrencyConflict)
        })
        .await;

        assert_eq!(result, Err(LedgerError::ConcurrencyConflict));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), LedgerError> = with_retry(&policy(5), "test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::ZeroAmount)
        })
        .await;

        assert_eq!(result, Err(LedgerError::ZeroAmount));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
