//! Retry policies.
//!
//! This module groups the knobs that control **how long** a resource waits after
//! a failed fetch.
//!
//! ## Contents
//! - [`BackoffPolicy`] one exponential curve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//! - [`RetryPolicy`]   picks a curve from the error kind and the [`FailureCount`]
//!
//! ## Quick wiring
//! ```text
//! EngineConfig { retry: RetryPolicy, .. }
//!      └─► core::poller::Poller on failure:
//!           - failures.record(err.kind())
//!           - retry.delay(err.kind(), &failures) to arm the retry timer
//! ```
//!
//! ## Defaults
//! - generic curve: `min(2s × 1.5^n, 15s)`
//! - exhaustion curve: `min(5s × 2^(n−3), 60s)` once 3 same-kind failures accumulated
//! - `JitterPolicy::None`

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{FailureCount, RetryPolicy};
