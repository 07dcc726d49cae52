//! # Events emitted by the engine, its poll loops and subscriber workers.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Engine events**: lifecycle of the whole engine and its global knobs
//! - **Resource events**: registration, interval changes
//! - **Poll events**: one fetch attempt and what came of it
//! - **Subscriber events**: problems in the observability pipeline itself
//!
//! The [`Event`] struct carries optional metadata (resource name, attempt,
//! failure count, delay, error kind, record count) depending on the kind.
//!
//! ## Ordering guarantees
//! Every event gets a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{ErrorKind, Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_resource("orders")
//!     .with_attempt(3)
//!     .with_failures(2)
//!     .with_error_kind(ErrorKind::TransientNetwork)
//!     .with_delay(Duration::from_millis(4500));
//!
//! assert_eq!(ev.resource.as_deref(), Some("orders"));
//! assert_eq!(ev.delay_ms, Some(4500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::ErrorKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Engine ===
    /// `start` registered resources and spawned their loops.
    ///
    /// Sets: `records` (number of resources).
    EngineStarted,

    /// `stop` finished: no loop is armed and no delivery will fire.
    EngineStopped,

    /// Global idle multiplier changed.
    ///
    /// Sets: `multiplier`.
    IdleMultiplierChanged,

    /// Host visibility changed.
    ///
    /// Sets: `visible`.
    VisibilityChanged,

    /// `poll_now` was requested for every registered resource.
    ///
    /// Sets: `records` (number of resources polled).
    PollNowRequested,

    // === Resources ===
    /// Resource registered and its loop spawned.
    ///
    /// Sets: `resource`, `delay_ms` (base interval).
    ResourceAdded,

    /// Resource loop joined and the resource dropped from the registry.
    ///
    /// Sets: `resource`.
    ResourceRemoved,

    /// Base interval of a resource changed.
    ///
    /// Sets: `resource`, `delay_ms` (new base interval).
    IntervalChanged,

    // === Polling ===
    /// A fetch attempt is starting.
    ///
    /// Sets: `resource`, `attempt`, `source`.
    PollStarting,

    /// A snapshot was handed to the delivery callback.
    ///
    /// Sets: `resource`, `attempt`, `source`, `records`.
    SnapshotDelivered,

    /// A fetch attempt failed.
    ///
    /// Sets: `resource`, `attempt` (loop-driven only), `source`, `error_kind`, `reason`.
    FetchFailed,

    /// A fetch attempt exceeded the configured timeout (always followed by `FetchFailed`).
    ///
    /// Sets: `resource`, `attempt`, `delay_ms` (the timeout).
    FetchTimedOut,

    /// Next regular poll armed after a success (or after an interval change).
    ///
    /// Sets: `resource`, `delay_ms` (effective interval), `visible`.
    PollScheduled,

    /// Retry armed after a failure.
    ///
    /// Sets: `resource`, `attempt`, `failures`, `error_kind`, `delay_ms`, `reason`.
    BackoffScheduled,

    /// A fetch resolved after the engine stopped; its result was dropped.
    ///
    /// Sets: `resource`, `attempt`, `source`.
    ResultDiscarded,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `resource` (subscriber name), `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `resource` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// What triggered a fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Regular poll timer (including the immediate first tick).
    Scheduled,
    /// Backoff timer after a failure.
    Retry,
    /// Out-of-band `poll_now`, independent of the loop.
    PollNow,
}

impl FetchSource {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchSource::Scheduled => "scheduled",
            FetchSource::Retry => "retry",
            FetchSource::PollNow => "poll_now",
        }
    }
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Resource (or subscriber) name, if applicable.
    pub resource: Option<Arc<str>>,
    /// Attempt number within the resource loop (starting from 1).
    pub attempt: Option<u32>,
    /// Consecutive failures after this attempt.
    pub failures: Option<u32>,
    /// Delay, interval or timeout in milliseconds, depending on the kind.
    pub delay_ms: Option<u64>,
    /// Classified error kind of a failure.
    pub error_kind: Option<ErrorKind>,
    /// Human-readable reason (error message, overflow details, ...).
    pub reason: Option<Arc<str>>,
    /// Number of records (or resources, for engine-level events).
    pub records: Option<usize>,
    /// What triggered the fetch.
    pub source: Option<FetchSource>,
    /// Host visibility at the time of the event.
    pub visible: Option<bool>,
    /// Idle multiplier, for `IdleMultiplierChanged`.
    pub multiplier: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            resource: None,
            attempt: None,
            failures: None,
            delay_ms: None,
            error_kind: None,
            reason: None,
            records: None,
            source: None,
            visible: None,
            multiplier: None,
        }
    }

    /// Attaches a resource name.
    #[inline]
    pub fn with_resource(mut self, name: impl Into<Arc<str>>) -> Self {
        self.resource = Some(name.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the consecutive failure count.
    #[inline]
    pub fn with_failures(mut self, n: u32) -> Self {
        self.failures = Some(n);
        self
    }

    /// Attaches a delay/interval (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches an error kind.
    #[inline]
    pub fn with_error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a record count.
    #[inline]
    pub fn with_records(mut self, n: usize) -> Self {
        self.records = Some(n);
        self
    }

    /// Attaches the fetch trigger.
    #[inline]
    pub fn with_source(mut self, source: FetchSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Attaches host visibility.
    #[inline]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Attaches the idle multiplier.
    #[inline]
    pub fn with_multiplier(mut self, m: u32) -> Self {
        self.multiplier = Some(m);
        self
    }

    /// Delay as a [`Duration`], if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_resource(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_resource(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::PollStarting);
        let b = Event::new(EventKind::PollStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_round_trips_through_millis() {
        let ev = Event::new(EventKind::PollScheduled).with_delay(Duration::from_millis(30_000));
        assert_eq!(ev.delay(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn overflow_event_names_subscriber() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.resource.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
