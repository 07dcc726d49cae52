//! # Classified retry policy (backoff controller).
//!
//! [`RetryPolicy`] turns a failed fetch into the delay before the next attempt of
//! the same resource. It is a pure function of the error kind and the resource's
//! [`FailureCount`]; the count itself lives in the poll loop that owns the resource.
//!
//! ## Curves
//! ```text
//! TransientNetwork                       → generic.next(total)
//! RateLimitOrExhaustion, streak <  3     → generic.next(total)
//! RateLimitOrExhaustion, streak >= 3     → exhaustion.next(streak - 3)
//! ```
//! With the default presets:
//! - generic: `min(2000 × 1.5^total, 15000)` ms
//! - exhaustion: `min(5000 × 2^(streak − 3), 60000)` ms
//!
//! `total` counts consecutive failures of any kind; `streak` counts the trailing
//! run of failures of the same kind. Both reset on success.

use std::time::Duration;

use crate::error::ErrorKind;
use crate::policies::BackoffPolicy;

/// Consecutive-failure bookkeeping for one resource.
///
/// Owned by the resource's poll loop; reset on every successful fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FailureCount {
    total: u32,
    streak: u32,
    last: Option<ErrorKind>,
}

impl FailureCount {
    /// Records one more failure of the given kind.
    pub fn record(&mut self, kind: ErrorKind) {
        self.total = self.total.saturating_add(1);
        if self.last == Some(kind) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last = Some(kind);
            self.streak = 1;
        }
    }

    /// Clears the counters after a successful fetch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Consecutive failures of any kind.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Length of the trailing run of failures of `kind` (0 if the last failure was another kind).
    pub fn streak(&self, kind: ErrorKind) -> u32 {
        if self.last == Some(kind) { self.streak } else { 0 }
    }
}

/// Picks a backoff curve by error kind and failure count.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use pollvisor::{ErrorKind, FailureCount, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// let mut failures = FailureCount::default();
///
/// for expected in [3000, 4500, 5000, 10000] {
///     failures.record(ErrorKind::RateLimitOrExhaustion);
///     let delay = policy.delay(ErrorKind::RateLimitOrExhaustion, &failures);
///     assert_eq!(delay, Duration::from_millis(expected));
/// }
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Curve for `TransientNetwork`, and for exhaustion failures below the threshold.
    pub generic: BackoffPolicy,
    /// Slow curve for exhaustion failures at or above the threshold.
    pub exhaustion: BackoffPolicy,
    /// Same-kind failures needed before the slow curve applies.
    pub exhaustion_threshold: u32,
}

impl Default for RetryPolicy {
    /// Generic and exhaustion presets with a threshold of 3.
    fn default() -> Self {
        Self {
            generic: BackoffPolicy::generic(),
            exhaustion: BackoffPolicy::exhaustion(),
            exhaustion_threshold: 3,
        }
    }
}

impl RetryPolicy {
    /// Computes the delay before retrying, given the failure that was just recorded.
    pub fn delay(&self, kind: ErrorKind, failures: &FailureCount) -> Duration {
        match kind {
            ErrorKind::RateLimitOrExhaustion => {
                let streak = failures.streak(kind);
                if streak >= self.exhaustion_threshold {
                    self.exhaustion.next(streak - self.exhaustion_threshold)
                } else {
                    self.generic.next(failures.total())
                }
            }
            ErrorKind::TransientNetwork => self.generic.next(failures.total()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_n(kind: ErrorKind, n: u32) -> FailureCount {
        let mut f = FailureCount::default();
        for _ in 0..n {
            f.record(kind);
        }
        f
    }

    #[test]
    fn generic_failures_follow_generic_curve() {
        let policy = RetryPolicy::default();
        for n in 1..10u32 {
            let f = record_n(ErrorKind::TransientNetwork, n);
            let expected_ms = (2000.0 * 1.5f64.powi(n as i32)).min(15_000.0);
            assert_eq!(
                policy.delay(ErrorKind::TransientNetwork, &f),
                Duration::from_secs_f64(expected_ms / 1000.0),
                "n={n}"
            );
        }
    }

    #[test]
    fn exhaustion_below_threshold_uses_generic_curve() {
        let policy = RetryPolicy::default();
        let kind = ErrorKind::RateLimitOrExhaustion;
        assert_eq!(policy.delay(kind, &record_n(kind, 1)), Duration::from_millis(3000));
        assert_eq!(policy.delay(kind, &record_n(kind, 2)), Duration::from_millis(4500));
    }

    #[test]
    fn exhaustion_at_threshold_uses_slow_curve() {
        let policy = RetryPolicy::default();
        let kind = ErrorKind::RateLimitOrExhaustion;
        for n in 3..12u32 {
            let expected_ms = (5000.0 * 2f64.powi((n - 3) as i32)).min(60_000.0);
            assert_eq!(
                policy.delay(kind, &record_n(kind, n)),
                Duration::from_secs_f64(expected_ms / 1000.0),
                "n={n}"
            );
        }
    }

    #[test]
    fn mixed_failures_restart_the_exhaustion_streak() {
        let policy = RetryPolicy::default();
        let mut f = FailureCount::default();
        f.record(ErrorKind::RateLimitOrExhaustion);
        f.record(ErrorKind::RateLimitOrExhaustion);
        f.record(ErrorKind::TransientNetwork);
        f.record(ErrorKind::RateLimitOrExhaustion);

        assert_eq!(f.total(), 4);
        assert_eq!(f.streak(ErrorKind::RateLimitOrExhaustion), 1);
        // Streak of 1 is below the threshold, so the generic curve uses total=4.
        assert_eq!(
            policy.delay(ErrorKind::RateLimitOrExhaustion, &f),
            Duration::from_millis(10125)
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut f = record_n(ErrorKind::RateLimitOrExhaustion, 5);
        f.reset();
        assert_eq!(f, FailureCount::default());
        assert_eq!(f.total(), 0);
        assert_eq!(f.streak(ErrorKind::RateLimitOrExhaustion), 0);
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let policy = RetryPolicy {
            exhaustion_threshold: 1,
            ..RetryPolicy::default()
        };
        let kind = ErrorKind::RateLimitOrExhaustion;
        assert_eq!(policy.delay(kind, &record_n(kind, 1)), Duration::from_secs(5));
        assert_eq!(policy.delay(kind, &record_n(kind, 2)), Duration::from_secs(10));
    }
}
