use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{EngineConfig, engine::Engine},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Engine`] with optional features.
pub struct EngineBuilder {
    cfg: EngineConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (fetch failures, backoff, deliveries, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and returns the Engine instance.
    ///
    /// This consumes the builder and initializes:
    /// - Event bus for broadcasting
    /// - Shared state and resource registry
    /// - Subscriber workers and the bus listener feeding them
    ///
    /// With subscribers attached, it must be called from within a tokio runtime.
    pub fn build(self) -> Engine {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let shutdown = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            subscriber_listener(&bus, subs, shutdown.clone());
        }
        Engine::from_parts(self.cfg, bus, shutdown)
    }
}

/// Forwards bus events to the subscriber set until the engine is dropped.
fn subscriber_listener(bus: &Bus, subs: Arc<SubscriberSet>, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    #[tokio::test]
    async fn subscribers_receive_engine_events() {
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];
        let engine = Engine::builder(EngineConfig::default())
            .with_subscribers(subs)
            .build();

        engine.set_idle_multiplier(4);
        for _ in 0..50 {
            if !collect.0.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            collect.0.lock().unwrap().as_slice(),
            &[EventKind::IdleMultiplierChanged]
        );
    }
}
