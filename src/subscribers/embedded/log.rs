//! # LogWriter — events rendered through `tracing`
//!
//! A minimal subscriber that turns each [`Event`] into one `tracing` record.
//! Use it for demos or as a starting point.
//!
//! ## Example output
//! ```text
//! WARN pollvisor: fetch failed resource="orders" attempt=2 kind="rate_limit_or_exhaustion" err="status=429 error: slow down"
//! WARN pollvisor: backoff scheduled resource="orders" attempt=2 failures=2 delay_ms=4500 kind="rate_limit_or_exhaustion"
//! DEBUG pollvisor: snapshot delivered resource="orders" attempt=3 records=12 source="retry"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that writes every event to `tracing` under the `pollvisor` target.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let resource = e.resource.as_deref().unwrap_or("-");
        let kind = e.error_kind.map(|k| k.as_label()).unwrap_or("-");
        let source = e.source.map(|s| s.as_label()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::EngineStarted => {
                info!(target: "pollvisor", resources = e.records, "engine started");
            }
            EventKind::EngineStopped => {
                info!(target: "pollvisor", "engine stopped");
            }
            EventKind::IdleMultiplierChanged => {
                info!(target: "pollvisor", multiplier = e.multiplier, "idle multiplier changed");
            }
            EventKind::VisibilityChanged => {
                info!(target: "pollvisor", visible = e.visible, "visibility changed");
            }
            EventKind::PollNowRequested => {
                info!(target: "pollvisor", resources = e.records, "poll now requested");
            }
            EventKind::ResourceAdded => {
                info!(target: "pollvisor", resource, interval_ms = e.delay_ms, "resource added");
            }
            EventKind::ResourceRemoved => {
                info!(target: "pollvisor", resource, "resource removed");
            }
            EventKind::IntervalChanged => {
                info!(target: "pollvisor", resource, interval_ms = e.delay_ms, "interval changed");
            }
            EventKind::PollStarting => {
                debug!(target: "pollvisor", resource, attempt = e.attempt, source, "poll starting");
            }
            EventKind::SnapshotDelivered => {
                debug!(
                    target: "pollvisor",
                    resource, attempt = e.attempt, records = e.records, source,
                    "snapshot delivered"
                );
            }
            EventKind::PollScheduled => {
                debug!(
                    target: "pollvisor",
                    resource, delay_ms = e.delay_ms, visible = e.visible,
                    "poll scheduled"
                );
            }
            EventKind::ResultDiscarded => {
                debug!(target: "pollvisor", resource, attempt = e.attempt, source, "result discarded");
            }
            EventKind::FetchFailed => {
                warn!(
                    target: "pollvisor",
                    resource, attempt = e.attempt, kind, source, err = reason,
                    "fetch failed"
                );
            }
            EventKind::FetchTimedOut => {
                warn!(
                    target: "pollvisor",
                    resource, attempt = e.attempt, timeout_ms = e.delay_ms,
                    "fetch timed out"
                );
            }
            EventKind::BackoffScheduled => {
                warn!(
                    target: "pollvisor",
                    resource, attempt = e.attempt, failures = e.failures, delay_ms = e.delay_ms, kind,
                    "backoff scheduled"
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "pollvisor", subscriber = resource, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "pollvisor", subscriber = resource, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
