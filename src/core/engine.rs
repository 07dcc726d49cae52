//! # Engine: public lifecycle surface of the polling engine.
//!
//! The [`Engine`] owns the event bus, the shared [`EngineState`] flags and the
//! resource [`Registry`]. It is an explicit object: construct it, pass clones to
//! whatever needs it, start and stop it as often as needed.
//!
//! ## Architecture
//! ```text
//! Engine::start(specs)
//!   ├─► state.activate()                (AlreadyActive if set)
//!   ├─► Registry::install(specs)        (one Poller per resource)
//!   └─► publish EngineStarted           ──► Disposer
//!
//! Engine::stop()
//!   ├─► state.deactivate()              (waits for in-progress deliveries)
//!   ├─► Registry::drain()               (cancel + join every poller)
//!   └─► publish EngineStopped           (only if it was active)
//!
//! Knobs:
//!   poll_now()            ──► one out-of-band fetch per resource
//!   set_interval(n, d)    ──► resource n re-arms if on a poll timer
//!   set_idle_multiplier() ──► next interval computation only
//!   visibility()          ──► VisibilityTracker
//! ```
//!
//! ## Rules
//! - After `stop` returns, no delivery callback fires until the next `start`.
//! - `start`/`stop` are serialized; `stop` is idempotent.
//! - Dropping the last clone cancels every poller and background task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::core::builder::EngineBuilder;
use crate::core::config::EngineConfig;
use crate::core::registry::Registry;
use crate::core::state::EngineState;
use crate::core::visibility::VisibilityTracker;
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::resources::ResourceSpec;

/// Adaptive multi-resource polling engine.
///
/// Cloning is cheap; all clones drive the same engine.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use pollvisor::{Engine, EngineConfig, FetchError, ResourceSpec};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), pollvisor::EngineError> {
///     let engine = Engine::new(EngineConfig::default());
///
///     let orders = ResourceSpec::from_fn(
///         "orders",
///         || async { Ok::<_, FetchError>(vec![1u32, 2, 3]) },
///         |records: Vec<u32>| println!("orders: {records:?}"),
///     )
///     .with_interval(Duration::from_secs(5));
///
///     let disposer = engine.start([orders]).await?;
///     assert!(engine.is_active());
///
///     disposer.dispose().await;
///     assert!(!engine.is_active());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) bus: Bus,
    pub(crate) state: Arc<EngineState>,
    pub(crate) shutdown: CancellationToken,
    registry: Registry,
    lifecycle: Mutex<()>,
    session: AtomicU64,
}

impl EngineInner {
    /// Spawns one out-of-band fetch per registered resource. Returns how many.
    pub(crate) async fn poll_now(&self) -> usize {
        if !self.state.is_active() {
            return 0;
        }
        let n = self.registry.poll_all().await;
        self.bus
            .publish(Event::new(EventKind::PollNowRequested).with_records(n));
        n
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.registry.shutdown();
        self.shutdown.cancel();
    }
}

impl Engine {
    /// Returns a builder, to attach event subscribers.
    pub fn builder(cfg: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(cfg)
    }

    /// Creates an engine without subscribers.
    ///
    /// Events are still available through [`Engine::events`].
    pub fn new(cfg: EngineConfig) -> Self {
        EngineBuilder::new(cfg).build()
    }

    pub(crate) fn from_parts(cfg: EngineConfig, bus: Bus, shutdown: CancellationToken) -> Self {
        let state = Arc::new(EngineState::new(cfg.idle_multiplier_clamped()));
        let registry = Registry::new(cfg, Arc::clone(&state), bus.clone());
        Self {
            inner: Arc::new(EngineInner {
                bus,
                state,
                shutdown,
                registry,
                lifecycle: Mutex::new(()),
                session: AtomicU64::new(0),
            }),
        }
    }

    /// Registers every resource and spawns its poll loop.
    ///
    /// The first fetch of each resource fires immediately. Resources sharing a
    /// name collapse to the last one given.
    ///
    /// # Errors
    /// [`EngineError::AlreadyActive`] if the engine is running; call [`Engine::stop`] first.
    pub async fn start(
        &self,
        resources: impl IntoIterator<Item = ResourceSpec>,
    ) -> Result<Disposer, EngineError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if !self.inner.state.activate().await {
            return Err(EngineError::AlreadyActive);
        }
        let session = self.inner.session.fetch_add(1, Ordering::AcqRel) + 1;

        let n = self.inner.registry.install(resources).await;
        self.inner
            .bus
            .publish(Event::new(EventKind::EngineStarted).with_records(n));

        Ok(Disposer {
            engine: self.clone(),
            session,
        })
    }

    /// Stops every poll loop and clears the registry with all failure counters.
    ///
    /// Waits for in-progress deliveries; once it returns, no callback fires until
    /// the next [`start`](Engine::start). Safe to call when not active.
    pub async fn stop(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.stop_locked().await;
    }

    async fn stop_locked(&self) {
        let was_active = self.inner.state.deactivate().await;
        self.inner.registry.drain().await;
        if was_active {
            self.inner.bus.publish(Event::new(EventKind::EngineStopped));
        }
    }

    /// Fetches every registered resource once, right now.
    ///
    /// Armed timers are left alone, so a resource may be fetched twice in close
    /// succession. A successful fetch resets the resource's failure count; a failed
    /// one does not count. Returns the number of fetches spawned (0 when the engine
    /// is not active).
    pub async fn poll_now(&self) -> usize {
        self.inner.poll_now().await
    }

    /// Updates the base interval of one resource.
    ///
    /// A resource waiting on its poll timer re-arms from now with the new effective
    /// interval; one waiting on a backoff timer is unaffected until its next success.
    /// A zero interval means `EngineConfig::default_interval`.
    ///
    /// # Errors
    /// [`EngineError::UnknownResource`] if `name` is not registered.
    pub async fn set_interval(&self, name: &str, interval: Duration) -> Result<(), EngineError> {
        let resolved = self.inner.registry.set_interval(name, interval).await?;
        self.inner.bus.publish(
            Event::new(EventKind::IntervalChanged)
                .with_resource(name)
                .with_delay(resolved),
        );
        Ok(())
    }

    /// Sets the global idle multiplier (clamped to `>= 1`).
    ///
    /// Applies to the next interval computation, never to an armed timer.
    pub fn set_idle_multiplier(&self, multiplier: u32) {
        let m = self.inner.state.set_idle_multiplier(multiplier);
        self.inner
            .bus
            .publish(Event::new(EventKind::IdleMultiplierChanged).with_multiplier(m));
    }

    /// Returns the tracker feeding host visibility into this engine.
    pub fn visibility(&self) -> VisibilityTracker {
        VisibilityTracker::new(self.clone())
    }

    /// Subscribes to the raw event stream.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.is_active()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.state.is_visible()
    }

    pub fn idle_multiplier(&self) -> u32 {
        self.inner.state.idle_multiplier()
    }

    /// Sorted names of the registered resources.
    pub async fn resources(&self) -> Vec<String> {
        self.inner.registry.list().await
    }

    /// Consecutive failures of `name`, or `None` if it is not registered.
    pub async fn failures(&self, name: &str) -> Option<u32> {
        self.inner.registry.failures(name).await
    }

    /// Base interval of `name`, or `None` if it is not registered.
    pub async fn interval(&self, name: &str) -> Option<Duration> {
        self.inner.registry.interval(name).await
    }
}

/// Stops the session it was returned from.
///
/// Disposing after the engine was stopped and started again is a no-op: a
/// disposer never stops a later session.
pub struct Disposer {
    engine: Engine,
    session: u64,
}

impl Disposer {
    /// Same as [`Engine::stop`], scoped to the originating session.
    pub async fn dispose(self) {
        let _lifecycle = self.engine.inner.lifecycle.lock().await;
        if self.engine.inner.session.load(Ordering::Acquire) == self.session {
            self.engine.stop_locked().await;
        }
    }

    /// The engine this disposer belongs to.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
