use std::future::Future;
use tokio::time::{sleep, Duration};

use crate::constants::{RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS};
use crate::error::SyncError;

/// Bounded exponential backoff for host readiness.
///
/// Only `SyncError::NotReady` is retried; any other outcome is returned as-is.
/// When attempts run out the caller gets `NotReady`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            max_attempts: RETRY_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Err(SyncError::NotReady) => {
                    if attempt + 1 < self.max_attempts {
                        let delay = self.delay_for(attempt);
                        tracing::debug!(
                            "{}: dependencies not ready (attempt {}), retrying in {:?}",
                            label,
                            attempt + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
                other => return other,
            }
        }

        tracing::warn!(
            "{}: gave up after {} readiness checks",
            label,
            self.max_attempts
        );
        Err(SyncError::NotReady)
    }
}
