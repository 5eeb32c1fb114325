//! Shared limiter in front of the generation capability.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::generation::GenerationError;

type CallRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Bounds in-flight generation calls and, if configured, calls per second.
///
/// Cloning shares the same limits.
#[derive(Clone)]
pub struct CallGate {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    limiter: Option<Arc<CallRateLimiter>>,
}

impl CallGate {
    /// `max_concurrent` of zero is treated as one. `calls_per_second` of zero
    /// disables rate limiting.
    #[must_use]
    pub fn new(max_concurrent: usize, calls_per_second: u32) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let limiter = NonZeroU32::new(calls_per_second)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            limiter,
        }
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a call slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, GenerationError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GenerationError::Config("call gate closed".to_string()))?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        Ok(permit)
    }
}

impl std::fmt::Debug for CallGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGate")
            .field("max_concurrent", &self.max_concurrent)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concurrency_means_one() {
        let gate = CallGate::new(0, 0);
        assert_eq!(gate.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let gate = CallGate::new(2, 0);
        {
            let _a = gate.acquire().await.expect("first");
            let _b = gate.acquire().await.expect("second");
            assert_eq!(gate.available(), 0);
        }
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn clones_share_limits() {
        let gate = CallGate::new(1, 100);
        let other = gate.clone();
        let _permit = gate.acquire().await.expect("permit");
        assert_eq!(other.available(), 0);
    }
}
