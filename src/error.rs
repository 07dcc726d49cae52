//! Error types used by the polling engine and by fetch operations.
//!
//! This module defines three types:
//!
//! - [`EngineError`]: errors raised by the engine facade itself (lifecycle misuse).
//! - [`FetchError`]: a failed fetch attempt, already classified into a closed set of kinds.
//! - [`ErrorKind`]: the tag of a [`FetchError`], the only input the backoff controller looks at.
//!
//! Both error enums provide helper methods (`as_label`, `as_message`) for logs and events.

use thiserror::Error;

/// # Errors produced by the engine facade.
///
/// Fetch failures never show up here: they are retried per resource and
/// reported through events only.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `start` was called while the engine was already running.
    ///
    /// Call `stop` (or drop the previous [`Disposer`](crate::Disposer) via `dispose`) first.
    #[error("engine is already active; stop it before starting again")]
    AlreadyActive,

    /// The named resource is not registered with the running engine.
    #[error("unknown resource: {name}")]
    UnknownResource {
        /// Name that was looked up.
        name: String,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::EngineError;
    ///
    /// let err = EngineError::UnknownResource { name: "orders".into() };
    /// assert_eq!(err.as_label(), "engine_unknown_resource");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::AlreadyActive => "engine_already_active",
            EngineError::UnknownResource { .. } => "engine_unknown_resource",
        }
    }
}

/// Classification of a failed fetch.
///
/// The two classes are disjoint and both are recoverable: they only pick which
/// backoff curve applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timeouts, connection errors, server errors and anything unclassified.
    TransientNetwork,
    /// Explicit throttling or transport resource exhaustion.
    RateLimitOrExhaustion,
}

impl ErrorKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::RateLimitOrExhaustion => "rate_limit_or_exhaustion",
        }
    }
}

/// # A failed fetch attempt.
///
/// Produced at the fetch boundary, either directly by the fetch operation or by
/// converting a [`RawFailure`](crate::RawFailure) through an
/// [`ErrorClassifier`](crate::ErrorClassifier).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure; retried on the generic curve.
    #[error("transient network failure{}: {message}", fmt_status(.status))]
    TransientNetwork {
        /// Optional numeric status/code reported by the transport.
        status: Option<u16>,
        /// Failure message.
        message: String,
    },

    /// Throttling or resource exhaustion; retried on the slow curve past the threshold.
    #[error("rate limited or exhausted{}: {message}", fmt_status(.status))]
    RateLimitOrExhaustion {
        /// Optional numeric status/code reported by the transport.
        status: Option<u16>,
        /// Failure message.
        message: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl FetchError {
    /// Shorthand for a [`FetchError::TransientNetwork`] without status.
    pub fn transient(message: impl Into<String>) -> Self {
        FetchError::TransientNetwork {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a [`FetchError::RateLimitOrExhaustion`] without status.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        FetchError::RateLimitOrExhaustion {
            status: None,
            message: message.into(),
        }
    }

    /// Returns the classification tag.
    ///
    /// # Example
    /// ```
    /// use pollvisor::{ErrorKind, FetchError};
    ///
    /// let err = FetchError::rate_limited("slow down");
    /// assert_eq!(err.kind(), ErrorKind::RateLimitOrExhaustion);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::TransientNetwork { .. } => ErrorKind::TransientNetwork,
            FetchError::RateLimitOrExhaustion { .. } => ErrorKind::RateLimitOrExhaustion,
        }
    }

    /// Returns the status/code attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::TransientNetwork { status, .. }
            | FetchError::RateLimitOrExhaustion { status, .. } => *status,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::TransientNetwork { .. } => "fetch_transient_network",
            FetchError::RateLimitOrExhaustion { .. } => "fetch_rate_limited",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::TransientNetwork { status, message }
            | FetchError::RateLimitOrExhaustion { status, message } => match status {
                Some(code) => format!("status={code} error: {message}"),
                None => format!("error: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_when_present() {
        let err = FetchError::RateLimitOrExhaustion {
            status: Some(429),
            message: "too many requests".into(),
        };
        assert_eq!(
            err.to_string(),
            "rate limited or exhausted (status 429): too many requests"
        );
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn display_omits_missing_status() {
        let err = FetchError::transient("connection reset");
        assert_eq!(err.to_string(), "transient network failure: connection reset");
        assert_eq!(err.as_message(), "error: connection reset");
    }

    #[test]
    fn kind_follows_variant() {
        assert_eq!(
            FetchError::transient("x").kind(),
            ErrorKind::TransientNetwork
        );
        assert_eq!(
            FetchError::rate_limited("x").kind(),
            ErrorKind::RateLimitOrExhaustion
        );
    }
}
