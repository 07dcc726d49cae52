//! # Engine configuration.
//!
//! Provides [`EngineConfig`], the centralized settings for an [`Engine`](crate::Engine).
//!
//! ## Sentinel values
//! - `fetch_timeout = 0s` → no timeout
//! - a resource interval of `0s` (or none) → `default_interval`
//! - `idle_multiplier = 0` → treated as 1

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for the polling engine.
///
/// ## Field semantics
/// - `default_interval`: base poll interval for resources that do not set one
/// - `idle_multiplier`: initial factor applied to intervals while backgrounded (`>= 1`)
/// - `retry`: backoff curves and exhaustion threshold
/// - `fetch_timeout`: default per-fetch timeout (`0s` = none)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base poll interval used when a resource does not set its own.
    pub default_interval: Duration,

    /// Initial idle multiplier; can be changed at runtime with
    /// [`Engine::set_idle_multiplier`](crate::Engine::set_idle_multiplier).
    pub idle_multiplier: u32,

    /// Backoff controller configuration.
    pub retry: RetryPolicy,

    /// Default per-fetch timeout.
    ///
    /// A fetch running longer is dropped and counts as a `TransientNetwork` failure.
    pub fetch_timeout: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl EngineConfig {
    /// Returns the default fetch timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn default_fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout == Duration::ZERO {
            None
        } else {
            Some(self.fetch_timeout)
        }
    }

    /// Resolves a per-resource interval: `None` or zero falls back to `default_interval`.
    #[inline]
    pub fn resolve_interval(&self, interval: Option<Duration>) -> Duration {
        match interval {
            Some(d) if d > Duration::ZERO => d,
            _ => self.default_interval.max(Duration::from_millis(1)),
        }
    }

    /// Returns the idle multiplier clamped to a minimum of 1.
    #[inline]
    pub fn idle_multiplier_clamped(&self) -> u32 {
        self.idle_multiplier.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `default_interval = 10s`
    /// - `idle_multiplier = 3`
    /// - `retry = RetryPolicy::default()` (generic 2s×1.5ⁿ ≤ 15s, exhaustion 5s×2ⁿ ≤ 60s after 3)
    /// - `fetch_timeout = 0s` (no timeout)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(10),
            idle_multiplier: 3,
            retry: RetryPolicy::default(),
            fetch_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_missing_interval_uses_default() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.resolve_interval(None), Duration::from_secs(10));
        assert_eq!(cfg.resolve_interval(Some(Duration::ZERO)), Duration::from_secs(10));
        assert_eq!(
            cfg.resolve_interval(Some(Duration::from_millis(250))),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn sentinels_are_clamped() {
        let cfg = EngineConfig {
            idle_multiplier: 0,
            bus_capacity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.idle_multiplier_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.default_fetch_timeout(), None);
    }
}
