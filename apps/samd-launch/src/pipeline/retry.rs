//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::config::RunnerSettings;
use crate::generation::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RunnerSettings::default())
    }
}

impl From<&RunnerSettings> for RetryPolicy {
    fn from(settings: &RunnerSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.backoff_base_ms),
            max_delay: Duration::from_millis(settings.backoff_cap_ms),
        }
    }
}

/// Result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, GenerationError>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Delay before the attempt following failed attempt `attempt` (1-based):
    /// `min(base * 2^(attempt - 1), max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let cap_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(base_ms.saturating_mul(factor).min(cap_ms))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// `max_attempts` calls have been made. `op` receives the 1-based
    /// attempt number.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "generation call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return RetryOutcome {
                        result: Err(err),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn backoff_doubles_until_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
        };
        let delays: Vec<u128> = (1..=6).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(200), policy.max_delay);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let outcome = fast(3)
            .execute(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(GenerationError::RateLimited)
                    } else {
                        Ok("text")
                    }
                }
            })
            .await;
        assert_eq!(outcome.result.expect("success"), "text");
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<()> = fast(3)
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GenerationError::EmptyResponse) }
            })
            .await;
        assert!(matches!(outcome.result, Err(GenerationError::EmptyResponse)));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let outcome: RetryOutcome<()> = fast(5)
            .execute(|_| async {
                Err(GenerationError::Api {
                    status: 401,
                    body: "invalid key".to_string(),
                })
            })
            .await;
        assert_eq!(outcome.attempts, 1);
    }
}
