//! Bounded retry with exponential backoff.
//!
//! Retry is expressed as an explicit higher-order wrapper over an async
//! operation rather than an attribute or macro: callers hand
//! [`retry_with_policy`] the policy and a closure producing one attempt,
//! and receive either the first success or the last error once attempts
//! are exhausted.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// An error that can report whether retrying it might help.
pub trait Retryable {
    /// Whether the failure is transient (network, provider availability)
    /// rather than permanent (malformed response, bad credentials).
    fn is_transient(&self) -> bool;
}

/// Parameters governing attempt count and backoff timing for transient
/// failures.
///
/// The delay doubles after each failed attempt, starting at `base_delay`
/// and capped at `max_delay`. The policy applies uniformly to every step's
/// underlying call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (must be at least 1).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
    /// When `true`, only errors reporting [`Retryable::is_transient`] are
    /// retried; permanent errors propagate immediately. When `false`
    /// (the default), every failure is retried until attempts run out.
    pub classify_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            classify_errors: false,
        }
    }
}

impl RetryPolicy {
    /// A policy with no backoff delays, for tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            classify_errors: false,
        }
    }

    /// Backoff delay after `retries_used` failed attempts.
    ///
    /// Doubles from `base_delay`, saturating at `max_delay`.
    #[must_use]
    pub fn backoff(&self, retries_used: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let shift = retries_used.min(20);
        let multiplier = 1u128 << shift;
        let backoff_ms = base_ms.saturating_mul(multiplier).min(max_ms);
        Duration::from_millis(u64::try_from(backoff_ms).unwrap_or(u64::MAX))
    }
}

/// Run `op` under `policy`, returning the first success or the last error.
///
/// `op` receives the 1-based attempt number. `on_retry` is invoked with the
/// upcoming attempt number and the backoff delay before each retry sleep;
/// it is the hook through which the executor emits retry events. Only the
/// final error is returned — intermediate failures are reported solely via
/// `on_retry`.
pub async fn retry_with_policy<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
    mut on_retry: impl FnMut(u32, Duration, &E),
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                if policy.classify_errors && !err.is_transient() {
                    return Err(err);
                }
                let delay = policy.backoff(attempt - 1);
                on_retry(attempt + 1, delay, &err);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(2));
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(8));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(10), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_zero_base_is_zero() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.backoff(5), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = retry_with_policy(
            &policy,
            |_attempt| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(TestError { transient: true })
                    } else {
                        Ok("done")
                    }
                }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<(), TestError> = retry_with_policy(
            &policy,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            },
            |_, _, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried_when_classifying() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            classify_errors: true,
            ..RetryPolicy::immediate(3)
        };

        let result: Result<(), TestError> = retry_with_policy(
            &policy,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            },
            |_, _, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_retried_by_default() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(2);

        let result: Result<(), TestError> = retry_with_policy(
            &policy,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            },
            |_, _, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_on_retry_reports_upcoming_attempts() {
        let policy = RetryPolicy::immediate(3);
        let mut reported = Vec::new();

        let _: Result<(), TestError> = retry_with_policy(
            &policy,
            |_attempt| async { Err(TestError { transient: true }) },
            |attempt, delay, _| reported.push((attempt, delay)),
        )
        .await;

        assert_eq!(reported, vec![(2, Duration::ZERO), (3, Duration::ZERO)]);
    }
}
