//! Bounded retry with backoff.
//!
//! Remote steps are attempt-once. The only polling loop is the optional
//! readiness probe that waits for the syncer on node 0 to accept connections
//! before any primary is started.

use std::time::Duration;

use tracing::debug;

use crate::error::RigError;
use crate::types::config::{BackoffStrategy, ReadinessSettings};

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How many attempts a probe gets and how long to wait between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, strategy: BackoffStrategy, base_delay_ms: u64) -> Self {
        RetryPolicy {
            max_attempts,
            strategy,
            base_delay_ms,
        }
    }

    pub fn from_settings(r: &ReadinessSettings) -> Self {
        RetryPolicy::new(r.attempts, r.backoff, r.delay_ms)
    }

    /// Whether the given attempt number (0-indexed) is within the budget.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Compute the delay in milliseconds after the given failed attempt.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        match self.strategy {
            BackoffStrategy::Fixed => self.base_delay_ms,
            BackoffStrategy::Linear => self.base_delay_ms.saturating_mul(attempt as u64 + 1),
            BackoffStrategy::Exponential => self
                .base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        }
    }
}

impl Default for RetryPolicy {
    /// Default: 5 attempts, exponential backoff, 500ms base delay.
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            strategy: BackoffStrategy::Exponential,
            base_delay_ms: 500,
        }
    }
}

/// Call `probe` until it succeeds or the policy runs out of attempts.
///
/// Returns the number of attempts used, or the last error.
pub fn retry<F>(policy: &RetryPolicy, mut probe: F) -> Result<u32, RigError>
where
    F: FnMut(u32) -> Result<(), RigError>,
{
    let mut attempt = 0;
    loop {
        match probe(attempt) {
            Ok(()) => return Ok(attempt + 1),
            Err(e) => {
                if !policy.should_retry(attempt + 1) {
                    return Err(e);
                }
                let delay = policy.delay_ms(attempt);
                debug!(attempt, delay_ms = delay, error = %e, "probe failed, retrying");
                if delay > 0 {
                    std::thread::sleep(Duration::from_millis(delay));
                }
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_err() -> RigError {
        RigError::Remote {
            host: "h".into(),
            message: "can't find session".into(),
        }
    }

    #[test]
    fn delays_by_strategy() {
        let fixed = RetryPolicy::new(3, BackoffStrategy::Fixed, 100);
        assert_eq!(fixed.delay_ms(0), 100);
        assert_eq!(fixed.delay_ms(4), 100);

        let linear = RetryPolicy::new(3, BackoffStrategy::Linear, 100);
        assert_eq!(linear.delay_ms(0), 100);
        assert_eq!(linear.delay_ms(2), 300);

        let exp = RetryPolicy::new(3, BackoffStrategy::Exponential, 100);
        assert_eq!(exp.delay_ms(0), 100);
        assert_eq!(exp.delay_ms(3), 800);
    }

    #[test]
    fn exponential_delay_saturates() {
        let exp = RetryPolicy::new(3, BackoffStrategy::Exponential, u64::MAX / 2);
        assert_eq!(exp.delay_ms(10), u64::MAX);
    }

    #[test]
    fn retry_stops_on_success() {
        let policy = RetryPolicy::new(5, BackoffStrategy::Fixed, 0);
        let used = retry(&policy, |attempt| if attempt < 2 { Err(remote_err()) } else { Ok(()) })
            .unwrap();
        assert_eq!(used, 3);
    }

    #[test]
    fn retry_gives_up_after_budget() {
        let policy = RetryPolicy::new(3, BackoffStrategy::Fixed, 0);
        let mut calls = 0;
        let err = retry(&policy, |_| {
            calls += 1;
            Err(remote_err())
        })
        .unwrap_err();
        assert_eq!(calls, 3);
        assert!(err.is_remote());
    }

    #[test]
    fn single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy::new(1, BackoffStrategy::Fixed, 60_000);
        assert!(retry(&policy, |_| Err(remote_err())).is_err());
    }
}
