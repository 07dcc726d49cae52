//! # Exponential backoff curve.
//!
//! [`BackoffPolicy`] maps a step number to a delay:
//! - [`BackoffPolicy::first`] the delay at step 0;
//! - [`BackoffPolicy::factor`] the multiplicative growth per step;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The delay for step `n` is `first × factor^n`, clamped to `max`, then jitter is
//! applied. The base is derived from the step alone, so jitter output never feeds
//! back into later delays.
//!
//! Two curves ship as presets and are wired by [`RetryPolicy`](crate::RetryPolicy):
//! - [`BackoffPolicy::generic`]: `min(2s × 1.5^n, 15s)`, stepped by the failure count;
//! - [`BackoffPolicy::exhaustion`]: `min(5s × 2^n, 60s)`, stepped from the exhaustion threshold.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::BackoffPolicy;
//!
//! let generic = BackoffPolicy::generic();
//! assert_eq!(generic.next(1), Duration::from_secs(3));
//! assert_eq!(generic.next(2), Duration::from_millis(4500));
//! assert_eq!(generic.next(10), Duration::from_secs(15));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Exponential backoff curve with cap and optional jitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay at step 0.
    pub first: Duration,
    /// Maximum delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied on top of the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Same as [`BackoffPolicy::generic`].
    fn default() -> Self {
        Self::generic()
    }
}

impl BackoffPolicy {
    /// Curve for network errors, server errors and unclassified failures:
    /// `first = 2s`, `factor = 1.5`, `max = 15s`, no jitter.
    pub const fn generic() -> Self {
        Self {
            first: Duration::from_millis(2_000),
            max: Duration::from_millis(15_000),
            factor: 1.5,
            jitter: JitterPolicy::None,
        }
    }

    /// Slow curve for rate-limit and resource-exhaustion failures:
    /// `first = 5s`, `factor = 2.0`, `max = 60s`, no jitter.
    pub const fn exhaustion() -> Self {
        Self {
            first: Duration::from_millis(5_000),
            max: Duration::from_millis(60_000),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy with the given jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay for the given step.
    ///
    /// The base delay is `first × factor^step`, clamped to [`BackoffPolicy::max`].
    /// Non-finite or negative intermediate values collapse to `max`.
    pub fn next(&self, step: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = step.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}
