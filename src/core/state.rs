//! # Process-wide engine flags.
//!
//! [`EngineState`] holds the three values every poll loop reads: active,
//! visible and the idle multiplier.
//!
//! ## Rules
//! - `active` lives behind an async `RwLock` gate. Deliveries hold a read guard
//!   for the whole callback; `stop` takes the write guard to flip it. Once
//!   `deactivate` returns, no delivery is running and none can start.
//! - `visible` and `idle_multiplier` are plain atomics, read when an interval is
//!   computed; changing them never touches an armed timer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::resources::Snapshot;

/// Shared flags for one engine.
pub(crate) struct EngineState {
    gate: RwLock<bool>,
    active: AtomicBool,
    visible: AtomicBool,
    idle_multiplier: AtomicU32,
}

impl EngineState {
    /// Creates an inactive, visible state.
    pub fn new(idle_multiplier: u32) -> Self {
        Self {
            gate: RwLock::new(false),
            active: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            idle_multiplier: AtomicU32::new(idle_multiplier.max(1)),
        }
    }

    /// Lock-free view of the active flag.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Flips inactive → active. Returns `false` if already active.
    pub async fn activate(&self) -> bool {
        let mut gate = self.gate.write().await;
        if *gate {
            return false;
        }
        *gate = true;
        self.active.store(true, Ordering::Release);
        true
    }

    /// Flips to inactive, waiting for in-progress deliveries. Returns the previous value.
    pub async fn deactivate(&self) -> bool {
        let mut gate = self.gate.write().await;
        self.active.store(false, Ordering::Release);
        std::mem::replace(&mut *gate, false)
    }

    /// Delivers `snapshot` unless the engine is inactive. Returns whether it was delivered.
    pub async fn deliver_if_active(&self, snapshot: Snapshot) -> bool {
        let gate = self.gate.read().await;
        if !*gate {
            return false;
        }
        snapshot.deliver().await;
        drop(gate);
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Stores visibility and returns the previous value.
    pub fn swap_visible(&self, visible: bool) -> bool {
        self.visible.swap(visible, Ordering::AcqRel)
    }

    pub fn idle_multiplier(&self) -> u32 {
        self.idle_multiplier.load(Ordering::Acquire)
    }

    /// Stores the multiplier (clamped to >= 1) and returns the stored value.
    pub fn set_idle_multiplier(&self, m: u32) -> u32 {
        let m = m.max(1);
        self.idle_multiplier.store(m, Ordering::Release);
        m
    }

    /// `base` when visible, `base × idle_multiplier` when backgrounded.
    pub fn effective_interval(&self, base: Duration) -> Duration {
        if self.is_visible() {
            base
        } else {
            base.saturating_mul(self.idle_multiplier())
        }
    }
}

/// Consecutive-failure count of one resource, shared by its poller and out-of-band fetches.
///
/// The poller owns the real [`FailureCount`](crate::policies::FailureCount) and
/// publishes its total here. A successful `poll_now` fetch clears it; the poller
/// picks that up before its next backoff computation.
#[derive(Debug, Default)]
pub(crate) struct FailureMirror {
    count: AtomicU32,
    cleared: AtomicBool,
}

impl FailureMirror {
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Stores the poller's current total.
    pub fn publish(&self, total: u32) {
        self.count.store(total, Ordering::Release);
    }

    /// Zeroes the count from outside the poller.
    pub fn clear(&self) {
        self.cleared.store(true, Ordering::Release);
        self.count.store(0, Ordering::Release);
    }

    /// Returns `true` once per [`clear`](Self::clear) since the last call.
    pub fn take_cleared(&self) -> bool {
        self.cleared.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Deliver;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn effective_interval_scales_only_in_background() {
        let state = EngineState::new(3);
        let base = Duration::from_millis(1000);
        assert_eq!(state.effective_interval(base), base);

        state.swap_visible(false);
        assert_eq!(state.effective_interval(base), Duration::from_millis(3000));

        state.set_idle_multiplier(5);
        assert_eq!(state.effective_interval(base), Duration::from_millis(5000));
    }

    #[test]
    fn cleared_mirror_reports_once() {
        let mirror = FailureMirror::default();
        mirror.publish(4);
        assert_eq!(mirror.get(), 4);
        assert!(!mirror.take_cleared());

        mirror.clear();
        assert_eq!(mirror.get(), 0);
        assert!(mirror.take_cleared());
        assert!(!mirror.take_cleared());
    }

    #[test]
    fn multiplier_is_clamped_to_one() {
        let state = EngineState::new(0);
        assert_eq!(state.idle_multiplier(), 1);
        assert_eq!(state.set_idle_multiplier(0), 1);
    }

    #[tokio::test]
    async fn activation_is_exclusive() {
        let state = EngineState::new(3);
        assert!(state.activate().await);
        assert!(!state.activate().await);
        assert!(state.deactivate().await);
        assert!(!state.deactivate().await);
        assert!(state.activate().await);
    }

    #[tokio::test]
    async fn inactive_state_discards_snapshots() {
        let state = EngineState::new(3);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sink: Arc<dyn Deliver<u8>> = Arc::new(move |_records: Vec<u8>| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!state.deliver_if_active(Snapshot::new(vec![1], sink.clone())).await);
        state.activate().await;
        assert!(state.deliver_if_active(Snapshot::new(vec![1], sink)).await);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
