//! # Resource registry: name → owned, cancelable poller handle.
//!
//! The registry owns one [`Handle`] per registered resource: the poller's join
//! handle, its cancellation token, the interval channel and the failure mirror.
//! `stop` drains it deterministically.
//!
//! ## Architecture
//! ```text
//! Engine::start ──► Registry::install(specs)
//!                     ├─► session token = root.child_token()
//!                     └─► per spec: Poller::run(session.child_token()) ──► Handle
//!
//! Engine::stop  ──► Registry::drain()
//!                     ├─► session.cancel()   (every armed poll/backoff timer)
//!                     └─► join every poller  ──► ResourceRemoved
//! ```
//!
//! ## Rules
//! - Names are unique; a later spec with the same name replaces an earlier one.
//! - The root token is cancelled when the engine is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::EngineConfig;
use crate::core::poller::Poller;
use crate::core::runner;
use crate::core::state::{EngineState, FailureMirror};
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::resources::{ResourceRef, ResourceSpec};

/// Handle to a running poller.
struct Handle {
    resource: ResourceRef,
    timeout: Option<Duration>,
    interval: watch::Sender<Duration>,
    failures: Arc<FailureMirror>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

struct Session {
    token: CancellationToken,
    handles: HashMap<Arc<str>, Handle>,
}

/// Registry of active resources.
pub(crate) struct Registry {
    session: RwLock<Session>,
    root: CancellationToken,
    cfg: EngineConfig,
    state: Arc<EngineState>,
    bus: Bus,
}

impl Registry {
    pub fn new(cfg: EngineConfig, state: Arc<EngineState>, bus: Bus) -> Self {
        let root = CancellationToken::new();
        Self {
            session: RwLock::new(Session {
                token: root.child_token(),
                handles: HashMap::new(),
            }),
            root,
            cfg,
            state,
            bus,
        }
    }

    /// Registers every spec and spawns its poller. Returns the number of resources.
    ///
    /// Leftovers from an interrupted session are cancelled first.
    pub async fn install(&self, specs: impl IntoIterator<Item = ResourceSpec>) -> usize {
        let mut by_name: HashMap<Arc<str>, ResourceSpec> = HashMap::new();
        for spec in specs {
            by_name.insert(spec.name_arc(), spec);
        }

        let stale = {
            let mut session = self.session.write().await;
            let stale = std::mem::take(&mut session.handles);
            session.token.cancel();
            session.token = self.root.child_token();

            for (name, spec) in by_name {
                let handle = self.spawn_poller(&session.token, Arc::clone(&name), spec);
                session.handles.insert(name, handle);
            }
            stale
        };
        let count = self.len().await;

        for (name, h) in stale {
            self.join_and_report(&name, h.join).await;
        }
        count
    }

    fn spawn_poller(
        &self,
        session: &CancellationToken,
        name: Arc<str>,
        spec: ResourceSpec,
    ) -> Handle {
        let base = self.cfg.resolve_interval(spec.interval());
        let timeout = spec.timeout().or(self.cfg.default_fetch_timeout());
        let (interval_tx, interval_rx) = watch::channel(base);
        let failures = Arc::new(FailureMirror::default());
        let cancel = session.child_token();

        self.bus.publish(
            Event::new(EventKind::ResourceAdded)
                .with_resource(Arc::clone(&name))
                .with_delay(base),
        );
        let poller = Poller {
            name,
            resource: Arc::clone(spec.resource()),
            timeout,
            retry: self.cfg.retry,
            interval: interval_rx,
            failures: Arc::clone(&failures),
            state: Arc::clone(&self.state),
            bus: self.bus.clone(),
        };
        let join = tokio::spawn(poller.run(cancel.clone()));

        Handle {
            resource: Arc::clone(spec.resource()),
            timeout,
            interval: interval_tx,
            failures,
            cancel,
            join,
        }
    }

    /// Cancels every poller, joins them and empties the registry.
    pub async fn drain(&self) {
        let handles: Vec<(Arc<str>, Handle)> = {
            let mut session = self.session.write().await;
            session.token.cancel();
            session.handles.drain().collect()
        };

        for (_, h) in &handles {
            h.cancel.cancel();
        }
        for (name, h) in handles {
            self.join_and_report(&name, h.join).await;
        }
    }

    /// Spawns one out-of-band fetch per resource. Returns how many were spawned.
    ///
    /// A successful fetch clears the resource's failure count.
    pub async fn poll_all(&self) -> usize {
        let session = self.session.read().await;
        for (name, h) in &session.handles {
            tokio::spawn(runner::poll_once(
                Arc::clone(&h.resource),
                Arc::clone(name),
                h.timeout,
                Arc::clone(&h.failures),
                Arc::clone(&self.state),
                h.cancel.child_token(),
                self.bus.clone(),
            ));
        }
        session.handles.len()
    }

    /// Updates the base interval of `name`; its poller re-arms if waiting on a poll timer.
    pub async fn set_interval(&self, name: &str, interval: Duration) -> Result<Duration, EngineError> {
        let session = self.session.read().await;
        let handle = session
            .handles
            .get(name)
            .ok_or_else(|| EngineError::UnknownResource { name: name.to_string() })?;

        let resolved = self.cfg.resolve_interval(Some(interval));
        handle.interval.send_replace(resolved);
        Ok(resolved)
    }

    /// Current base interval of `name`.
    pub async fn interval(&self, name: &str) -> Option<Duration> {
        let session = self.session.read().await;
        session.handles.get(name).map(|h| *h.interval.borrow())
    }

    /// Consecutive failures last recorded by the poller of `name`.
    pub async fn failures(&self, name: &str) -> Option<u32> {
        let session = self.session.read().await;
        session
            .handles
            .get(name)
            .map(|h| h.failures.get())
    }

    /// Returns sorted list of registered resource names.
    pub async fn list(&self) -> Vec<String> {
        let session = self.session.read().await;
        let mut names: Vec<String> = session.handles.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub async fn len(&self) -> usize {
        self.session.read().await.handles.len()
    }

    /// Cancels everything this registry ever spawned (engine drop).
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Awaits join and always emits `ResourceRemoved`.
    async fn join_and_report(&self, name: &Arc<str>, join: JoinHandle<()>) {
        if let Err(je) = join.await {
            if je.is_panic() {
                self.bus.publish(
                    Event::new(EventKind::ResourceRemoved)
                        .with_resource(Arc::clone(name))
                        .with_reason("poller_panic"),
                );
                return;
            }
        }
        self.bus
            .publish(Event::new(EventKind::ResourceRemoved).with_resource(Arc::clone(name)));
    }
}
