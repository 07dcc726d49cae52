//! # Jitter for backoff delays.
//!
//! [`JitterPolicy`] spreads retries of many resources that failed together (for
//! example after the backend came back from an outage) so they do not hit the
//! backend in lockstep.
//!
//! - [`JitterPolicy::None`]: exact delay (default, keeps the documented curves exact)
//! - [`JitterPolicy::Full`]: uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + uniform[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`]: uniform in `[floor, min(delay × 3, max)]`

use rand::Rng;
use std::time::Duration;

/// Randomization strategy applied to a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact delay.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Upper half of the delay: `delay/2 + uniform[0, delay/2]`.
    Equal,
    /// Uniform in `[floor, min(delay × 3, max)]`; see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` needs a floor and a cap, so here it returns `delay` unchanged.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rng.random_range(0..=half))
            }
        }
    }

    /// Applies decorrelated jitter between `floor` and `min(delay × 3, max)`.
    ///
    /// Falls back to [`apply`](Self::apply) for the other variants.
    pub fn apply_decorrelated(&self, floor: Duration, delay: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(delay);
        }

        let floor_ms = floor.as_millis() as u64;
        let upper_ms = (delay.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(floor_ms);

        if floor_ms >= upper_ms {
            return floor;
        }
        Duration::from_millis(rand::rng().random_range(floor_ms..=upper_ms))
    }
}
