//! # Poller: per-resource scheduling loop.
//!
//! Keeps one resource fresh: waits, fetches, delivers, and picks the next wait
//! from either the effective interval (success) or the retry policy (failure).
//!
//! ## State machine
//! ```text
//! Idle ──► Scheduled ──► Fetching ──┬─ Ok  ──► deliver, failures=0 ──► Scheduled(effective interval)
//!   (first tick          │          └─ Err ──► failures+1, classify ──► Backoff(retry delay)
//!    is immediate)       │                                                 │
//!                        │                       Backoff ──► Fetching ◄────┘
//!                        ▼
//!                   Terminated  (engine inactive, token cancelled, or resource unregistered)
//! ```
//!
//! ## Rules
//! - Fetches run **sequentially** within one poller; the next timer is armed
//!   only after the previous attempt resolved.
//! - At most one timer is armed at any time.
//! - A poll timer re-arms when the base interval changes; a backoff timer never does.
//! - Visibility and multiplier changes apply to the next computed interval only.
//! - The failure counter lives here and is mirrored into the registry for introspection.
//!   A successful out-of-band fetch clears it; an armed backoff timer stays armed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::runner::{self, AttemptInfo, FetchOutcome};
use crate::core::state::{EngineState, FailureMirror};
use crate::events::{Bus, Event, EventKind, FetchSource};
use crate::policies::{FailureCount, RetryPolicy};
use crate::resources::ResourceRef;

/// What the poller is waiting for before the next fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Wait {
    Poll(Duration),
    Backoff(Duration),
}

/// Supervises fetching of a single resource.
pub(crate) struct Poller {
    pub name: Arc<str>,
    pub resource: ResourceRef,
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
    pub interval: watch::Receiver<Duration>,
    pub failures: Arc<FailureMirror>,
    pub state: Arc<EngineState>,
    pub bus: Bus,
}

impl Poller {
    /// Runs until the engine stops, the token is cancelled, or the resource is unregistered.
    pub async fn run(mut self, token: CancellationToken) {
        let mut failures = FailureCount::default();
        let mut attempt: u32 = 0;
        let mut wait = Wait::Poll(Duration::ZERO);

        loop {
            let source = match wait {
                Wait::Poll(delay) => {
                    if !self.wait_poll(delay, &token).await {
                        break;
                    }
                    FetchSource::Scheduled
                }
                Wait::Backoff(delay) => {
                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = &mut sleep => {}
                    }
                    FetchSource::Retry
                }
            };
            if !self.state.is_active() {
                break;
            }

            attempt = attempt.saturating_add(1);
            let info = AttemptInfo {
                name: &self.name,
                source,
                attempt: Some(attempt),
            };

            match runner::fetch_once(self.resource.as_ref(), info, self.timeout, &token, &self.bus)
                .await
            {
                FetchOutcome::Cancelled => break,
                FetchOutcome::Fetched(snapshot) => {
                    if !runner::deliver(&self.state, snapshot, info, &self.bus).await {
                        break;
                    }
                    failures.reset();
                    self.failures.take_cleared();
                    self.failures.publish(0);

                    let next = self.effective_interval();
                    self.publish_poll_scheduled(next);
                    wait = Wait::Poll(next);
                }
                FetchOutcome::Failed(err) => {
                    let kind = err.kind();
                    if self.failures.take_cleared() {
                        failures.reset();
                    }
                    failures.record(kind);
                    self.failures.publish(failures.total());
                    if !self.state.is_active() {
                        break;
                    }

                    let delay = self.retry.delay(kind, &failures);
                    self.bus.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_resource(Arc::clone(&self.name))
                            .with_attempt(attempt)
                            .with_failures(failures.total())
                            .with_error_kind(kind)
                            .with_delay(delay)
                            .with_reason(err.as_message()),
                    );
                    wait = Wait::Backoff(delay);
                }
            }
        }
    }

    /// Waits on the poll timer. Returns `false` if the poller must terminate.
    ///
    /// A base-interval change re-arms the timer from now with the new effective interval.
    async fn wait_poll(&mut self, delay: Duration, token: &CancellationToken) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return false,
                _ = &mut sleep => return true,
                changed = self.interval.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    let next = self.effective_interval();
                    self.publish_poll_scheduled(next);
                    sleep.as_mut().reset(deadline_after(next));
                }
            }
        }
    }

    fn effective_interval(&mut self) -> Duration {
        let base = *self.interval.borrow_and_update();
        self.state.effective_interval(base)
    }

    fn publish_poll_scheduled(&self, delay: Duration) {
        self.bus.publish(
            Event::new(EventKind::PollScheduled)
                .with_resource(Arc::clone(&self.name))
                .with_delay(delay)
                .with_visible(self.state.is_visible()),
        );
    }
}

/// Roughly 30 years, the same horizon `tokio::time::sleep` uses for unreachable deadlines.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, saturating to a far-future instant instead of overflowing.
fn deadline_after(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}
