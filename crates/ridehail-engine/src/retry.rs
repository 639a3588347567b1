//! Bounded retry for transactions that lose a serialization race.
//!
//! A [`RetryPolicy`] re-runs a whole transaction when the retryable predicate
//! accepts the error, sleeping `base_delay * 2^n` plus random jitter between
//! attempts. Every other error is returned immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Default attempt bound, first try included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default upper bound of the random jitter added to each delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(100);

/// Exponential backoff with jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, first try included. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later one.
    pub base_delay: Duration,
    /// Upper bound (inclusive) of the uniform jitter added to each delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Set the attempt bound.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the first retry delay.
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the jitter bound.
    #[must_use]
    pub const fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Backoff before retry number `retry` (0 for the first retry), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.checked_pow(retry).unwrap_or(u32::MAX))
    }

    /// Backoff before retry number `retry`, with jitter applied.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.backoff(retry).saturating_add(jitter)
    }

    /// Run `operation` until it succeeds, fails with an error `retryable`
    /// rejects, or the attempt bound is reached.
    ///
    /// # Errors
    ///
    /// Returns the last error from `operation`.
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: core::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Transaction succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < max_attempts && retryable(&err) => {
                    let delay = self.delay_for_retry(attempt.saturating_sub(1));
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transaction conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => {
                    if attempt > 1 {
                        tracing::warn!(attempt, error = %err, "Transaction failed after retry");
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Failure {
        Transient,
        Fatal,
    }

    impl core::fmt::Display for Failure {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy::default()
            .with_base_delay(Duration::from_millis(1))
            .with_max_jitter(Duration::ZERO)
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for_retry(1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn huge_retry_index_saturates() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(64) >= policy.backoff(10));
    }

    #[tokio::test]
    async fn retries_transient_until_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Failure> = fast()
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::Transient)
                },
                |e| *e == Failure::Transient,
            )
            .await;

        assert_eq!(result, Err(Failure::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Failure> = fast()
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::Fatal)
                },
                |e| *e == Failure::Transient,
            )
            .await;

        assert_eq!(result, Err(Failure::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run(
                || async {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Failure::Transient)
                    } else {
                        Ok(7)
                    }
                },
                |e| *e == Failure::Transient,
            )
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_retry_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), Failure> = RetryPolicy::no_retry()
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::Transient)
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
