//! # One fetch attempt.
//!
//! [`fetch_once`] runs a single fetch of a resource with optional timeout and
//! cancellation; [`deliver`] hands a snapshot over through the engine's active gate.
//! Both publish their lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   PollStarting → fetch() → Ok(snapshot) → deliver() → SnapshotDelivered
//!                                                     → ResultDiscarded (engine stopped)
//! Failure:
//!   PollStarting → fetch() → Err(e) → FetchFailed
//! Timeout:
//!   PollStarting → timeout exceeded → FetchTimedOut → FetchFailed (TransientNetwork)
//! Cancellation:
//!   PollStarting → token cancelled → (fetch future dropped, nothing else published)
//! ```
//!
//! ## Rules
//! - Publishes **at most one** terminal event per attempt.
//! - A cancelled attempt yields [`FetchOutcome::Cancelled`]; its result is never observed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::state::{EngineState, FailureMirror};
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind, FetchSource};
use crate::resources::{Resource, Snapshot};

/// Result of one attempt.
pub(crate) enum FetchOutcome {
    Fetched(Snapshot),
    Failed(FetchError),
    Cancelled,
}

/// Identity of one attempt, for events.
#[derive(Clone, Copy)]
pub(crate) struct AttemptInfo<'a> {
    pub name: &'a Arc<str>,
    pub source: FetchSource,
    /// Loop attempt number; `None` for out-of-band fetches.
    pub attempt: Option<u32>,
}

impl AttemptInfo<'_> {
    fn event(&self, kind: EventKind) -> Event {
        let ev = Event::new(kind)
            .with_resource(Arc::clone(self.name))
            .with_source(self.source);
        match self.attempt {
            Some(n) => ev.with_attempt(n),
            None => ev,
        }
    }
}

/// Executes a single fetch of `resource`, publishing lifecycle events to `bus`.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)` and `dur > 0`, the fetch future is dropped after
/// `dur` and the attempt fails with `TransientNetwork`.
pub(crate) async fn fetch_once(
    resource: &dyn Resource,
    info: AttemptInfo<'_>,
    timeout: Option<Duration>,
    token: &CancellationToken,
    bus: &Bus,
) -> FetchOutcome {
    bus.publish(info.event(EventKind::PollStarting));

    let fetch = async {
        match timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => match time::timeout(dur, resource.fetch()).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    bus.publish(info.event(EventKind::FetchTimedOut).with_delay(dur));
                    Err(FetchError::transient(format!("fetch timed out after {dur:?}")))
                }
            },
            None => resource.fetch().await,
        }
    };

    let res = tokio::select! {
        biased;
        _ = token.cancelled() => return FetchOutcome::Cancelled,
        res = fetch => res,
    };

    match res {
        Ok(snapshot) => FetchOutcome::Fetched(snapshot),
        Err(e) => {
            bus.publish(
                info.event(EventKind::FetchFailed)
                    .with_error_kind(e.kind())
                    .with_reason(e.as_message()),
            );
            FetchOutcome::Failed(e)
        }
    }
}

/// Delivers `snapshot` through the engine gate. Returns `false` if it was discarded.
pub(crate) async fn deliver(
    state: &EngineState,
    snapshot: Snapshot,
    info: AttemptInfo<'_>,
    bus: &Bus,
) -> bool {
    let records = snapshot.len();
    if state.deliver_if_active(snapshot).await {
        bus.publish(info.event(EventKind::SnapshotDelivered).with_records(records));
        true
    } else {
        bus.publish(info.event(EventKind::ResultDiscarded));
        false
    }
}

/// Out-of-band fetch used by `poll_now`: one attempt, delivered if it succeeds.
///
/// Never touches the resource loop's timer. A delivered snapshot clears `failures`;
/// a failure leaves it alone.
pub(crate) async fn poll_once(
    resource: Arc<dyn Resource>,
    name: Arc<str>,
    timeout: Option<Duration>,
    failures: Arc<FailureMirror>,
    state: Arc<EngineState>,
    token: CancellationToken,
    bus: Bus,
) {
    let info = AttemptInfo {
        name: &name,
        source: FetchSource::PollNow,
        attempt: None,
    };
    if let FetchOutcome::Fetched(snapshot) =
        fetch_once(resource.as_ref(), info, timeout, &token, &bus).await
    {
        if deliver(&state, snapshot, info, &bus).await {
            failures.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::ResourceFn;

    fn name() -> Arc<str> {
        Arc::from("r")
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_transient_failure() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let res: ResourceFn<u8, _> = ResourceFn::new(
            || async {
                std::future::pending::<()>().await;
                Ok::<_, FetchError>(vec![])
            },
            |_records: Vec<u8>| {},
        );
        let n = name();
        let info = AttemptInfo {
            name: &n,
            source: FetchSource::Scheduled,
            attempt: Some(1),
        };

        let out = fetch_once(
            &res,
            info,
            Some(Duration::from_secs(1)),
            &CancellationToken::new(),
            &bus,
        )
        .await;

        match out {
            FetchOutcome::Failed(e) => assert_eq!(e.kind(), ErrorKind::TransientNetwork),
            _ => panic!("expected failure"),
        }
        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PollStarting,
                EventKind::FetchTimedOut,
                EventKind::FetchFailed
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drops_the_fetch() {
        let bus = Bus::new(16);
        let token = CancellationToken::new();
        let res: ResourceFn<u8, _> = ResourceFn::new(
            || async {
                time::sleep(Duration::from_secs(5)).await;
                Ok::<_, FetchError>(vec![1])
            },
            |_records: Vec<u8>| {},
        );
        let n = name();
        let info = AttemptInfo {
            name: &n,
            source: FetchSource::Retry,
            attempt: Some(2),
        };

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let out = fetch_once(&res, info, None, &token, &bus).await;
        assert!(matches!(out, FetchOutcome::Cancelled));
    }
}
