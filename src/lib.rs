//! # pollvisor
//!
//! **Pollvisor** keeps local state fresh by periodically re-fetching several
//! independently named remote resources over a plain request/response API.
//!
//! Each resource gets its own poll loop. Loops throttle while the host is in the
//! background, back off on failures with a curve picked by the error class, and
//! never affect one another.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ ResourceSpec │   │ ResourceSpec │   │ ResourceSpec │
//!     │  ("orders")  │   │  ("prices")  │   │  ("alerts")  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (lifecycle facade)                                        │
//! │  - EngineState (active / visible / idle multiplier)               │
//! │  - Registry (name → poller handle, interval channel, failures)    │
//! │  - VisibilityTracker (foreground edge → poll_now)                 │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │    Poller    │   │    Poller    │   │    Poller    │   │
//!     │ (timer loop) │   │ (timer loop) │   │ (timer loop) │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │ Publishes:
//!      │ - PollStarting   │                  │                 │ - EngineStarted
//!      │ - FetchFailed    │                  │                 │ - VisibilityChanged
//!      │ - BackoffSched.  │                  │                 │ - ...
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: EngineConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      LogWriter  worker2  workerN
//! ```
//!
//! ### Lifecycle of one resource
//! ```text
//! Engine::start ──► Registry ──► Poller::run()
//!
//! wait = immediate
//! loop {
//!   ├─► wait (poll timer re-arms on set_interval; backoff timer does not)
//!   ├─► engine inactive? ─► exit
//!   ├─► publish PollStarting{ resource, attempt }
//!   ├─► fetch_once(resource, timeout)
//!   │       │
//!   │       ├─ Ok  ──► deliver snapshot (discarded if stopped) ─► SnapshotDelivered
//!   │       │          ├─ failures = 0
//!   │       │          └─ wait = base interval (× idle multiplier when backgrounded)
//!   │       │
//!   │       └─ Err ──► publish FetchFailed{ kind, reason }
//!   │                  ├─ failures += 1
//!   │                  ├─ delay = retry.delay(kind, failures)
//!   │                  ├─ publish BackoffScheduled{ delay, failures }
//!   │                  └─ wait = delay
//!   │
//!   └─ exit conditions: Engine::stop, engine dropped
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Engine**        | Start/stop, poll now, interval and idle multiplier knobs.       | [`Engine`], [`Disposer`]                    |
//! | **Resources**     | Fetch functions and delivery callbacks, named and scheduled.    | [`Resource`], [`ResourceFn`], [`ResourceSpec`] |
//! | **Visibility**    | Foreground/background signal of the host.                      | [`VisibilityTracker`], [`Visibility`]       |
//! | **Policies**      | Generic and exhaustion backoff curves.                          | [`RetryPolicy`], [`BackoffPolicy`]          |
//! | **Errors**        | Classified fetch errors and facade errors.                      | [`FetchError`], [`ErrorKind`], [`EngineError`] |
//! | **Subscriber API**| Hook into every fetch, failure and lifecycle event.             | [`Subscribe`]                               |
//! | **Configuration** | Centralize engine settings.                                     | [`EngineConfig`]                            |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (renders events through `tracing`).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pollvisor::{Engine, EngineConfig, RawFailure, ResourceSpec, Visibility};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn pollvisor::Subscribe>> = vec![Arc::new(pollvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn pollvisor::Subscribe>> = Vec::new();
//!
//!     let engine = Engine::builder(EngineConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Raw transport failures are classified at the fetch boundary.
//!     let prices = ResourceSpec::from_fn(
//!         "prices",
//!         || async { Ok::<_, RawFailure>(vec![101.5f64, 99.0]) },
//!         |records: Vec<f64>| println!("prices: {records:?}"),
//!     )
//!     .with_interval(Duration::from_secs(2));
//!
//!     let disposer = engine.start([prices]).await?;
//!     engine.visibility().observe(Visibility::Background).await;
//!     engine.set_idle_multiplier(4);
//!
//!     disposer.dispose().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod resources;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Disposer, Engine, EngineBuilder, EngineConfig, Visibility, VisibilityTracker};
pub use error::{EngineError, ErrorKind, FetchError};
pub use events::{Event, EventKind, FetchSource};
pub use policies::{BackoffPolicy, FailureCount, JitterPolicy, RetryPolicy};
pub use resources::{
    BoxFetchFuture, Deliver, ErrorClassifier, MarkerClassifier, RawFailure, Resource, ResourceFn,
    ResourceRef, ResourceSpec, Snapshot,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in subscriber that logs through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
