//! # Fetch error adapter.
//!
//! Transport clients fail with a status code and a message. [`RawFailure`] carries
//! exactly that, and an [`ErrorClassifier`] maps it to the closed [`ErrorKind`] set
//! before the backoff controller sees it.
//!
//! [`MarkerClassifier`] (the default) treats the following as
//! `RateLimitOrExhaustion`:
//! - status `429`,
//! - a message containing one of its markers (case-insensitive):
//!   `rate limit`, `rate-limit`, `too many requests`, `resource exhausted`,
//!   `insufficient_resources`, `quota exceeded`, `throttl`.
//!
//! Everything else is `TransientNetwork`.

use crate::error::{ErrorKind, FetchError};

/// Untyped failure as reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFailure {
    /// Optional status/code (HTTP status, gRPC code, ...).
    pub status: Option<u16>,
    /// Failure message.
    pub message: String,
}

impl RawFailure {
    /// Creates a raw failure.
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Classifies with the given classifier.
    pub fn classify_with(self, classifier: &dyn ErrorClassifier) -> FetchError {
        let RawFailure { status, message } = self;
        match classifier.classify(status, &message) {
            ErrorKind::TransientNetwork => FetchError::TransientNetwork { status, message },
            ErrorKind::RateLimitOrExhaustion => {
                FetchError::RateLimitOrExhaustion { status, message }
            }
        }
    }
}

impl From<RawFailure> for FetchError {
    /// Classifies with [`MarkerClassifier::default`].
    fn from(raw: RawFailure) -> Self {
        raw.classify_with(&MarkerClassifier::default())
    }
}

/// Maps a raw failure to an [`ErrorKind`].
pub trait ErrorClassifier: Send + Sync {
    /// Returns the kind for the given status and message.
    fn classify(&self, status: Option<u16>, message: &str) -> ErrorKind;
}

/// Classifier matching throttling status codes and message markers.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    statuses: Vec<u16>,
    markers: Vec<String>,
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self {
            statuses: vec![429],
            markers: [
                "rate limit",
                "rate-limit",
                "too many requests",
                "resource exhausted",
                "insufficient_resources",
                "quota exceeded",
                "throttl",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl MarkerClassifier {
    /// Adds a status code treated as rate limiting.
    pub fn with_status(mut self, status: u16) -> Self {
        self.statuses.push(status);
        self
    }

    /// Adds a message marker (matched case-insensitively).
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into().to_lowercase());
        self
    }
}

impl ErrorClassifier for MarkerClassifier {
    fn classify(&self, status: Option<u16>, message: &str) -> ErrorKind {
        if status.is_some_and(|s| self.statuses.contains(&s)) {
            return ErrorKind::RateLimitOrExhaustion;
        }
        let message = message.to_lowercase();
        if self.markers.iter().any(|m| message.contains(m.as_str())) {
            ErrorKind::RateLimitOrExhaustion
        } else {
            ErrorKind::TransientNetwork
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limit() {
        let c = MarkerClassifier::default();
        assert_eq!(c.classify(Some(429), "nope"), ErrorKind::RateLimitOrExhaustion);
    }

    #[test]
    fn markers_match_case_insensitively() {
        let c = MarkerClassifier::default();
        for msg in [
            "Rate limit exceeded",
            "net::ERR_INSUFFICIENT_RESOURCES",
            "RESOURCE EXHAUSTED: try later",
            "request was throttled",
        ] {
            assert_eq!(c.classify(None, msg), ErrorKind::RateLimitOrExhaustion, "{msg}");
        }
    }

    #[test]
    fn everything_else_is_transient() {
        let c = MarkerClassifier::default();
        assert_eq!(c.classify(Some(503), "service unavailable"), ErrorKind::TransientNetwork);
        assert_eq!(c.classify(None, "connection reset by peer"), ErrorKind::TransientNetwork);
    }

    #[test]
    fn custom_status_and_marker() {
        let c = MarkerClassifier::default()
            .with_status(503)
            .with_marker("Backend Busy");
        assert_eq!(c.classify(Some(503), ""), ErrorKind::RateLimitOrExhaustion);
        assert_eq!(c.classify(None, "backend busy"), ErrorKind::RateLimitOrExhaustion);
    }

    #[test]
    fn conversion_keeps_status_and_message() {
        let err: FetchError = RawFailure::new(Some(500), "boom").into();
        assert_eq!(
            err,
            FetchError::TransientNetwork {
                status: Some(500),
                message: "boom".into()
            }
        );
    }

    #[test]
    fn classify_with_custom_classifier() {
        struct AlwaysExhausted;
        impl ErrorClassifier for AlwaysExhausted {
            fn classify(&self, _: Option<u16>, _: &str) -> ErrorKind {
                ErrorKind::RateLimitOrExhaustion
            }
        }
        let err = RawFailure::new(None, "timeout").classify_with(&AlwaysExhausted);
        assert_eq!(err.kind(), ErrorKind::RateLimitOrExhaustion);
    }
}
