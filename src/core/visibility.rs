//! # Visibility tracker: foreground/background signal of the host.
//!
//! ```text
//! host signal ──► VisibilityTracker::observe(v)
//!                   ├─ same as before  ──► ignored (edges only)
//!                   ├─ → Background    ──► visible=false, VisibilityChanged
//!                   └─ → Foreground    ──► visible=true,  VisibilityChanged, Engine::poll_now()
//! ```
//!
//! ## Rules
//! - Background only flips the flag; in-flight fetches and armed timers are untouched.
//! - Foreground triggers one out-of-band fetch per resource. A resource in backoff
//!   still waits out its computed delay.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::engine::{Engine, EngineInner};
use crate::events::{Event, EventKind};

/// Host visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The host is visible; resources poll at their base interval.
    #[default]
    Foreground,
    /// The host is hidden; intervals are scaled by the idle multiplier.
    Background,
}

impl Visibility {
    /// Maps a plain "is visible" flag.
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Foreground
        } else {
            Visibility::Background
        }
    }

    pub fn is_foreground(self) -> bool {
        matches!(self, Visibility::Foreground)
    }
}

/// Feeds host visibility into an [`Engine`].
///
/// Obtained from [`Engine::visibility`]. Cloning is cheap.
#[derive(Clone)]
pub struct VisibilityTracker {
    engine: Engine,
}

impl VisibilityTracker {
    pub(crate) fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Current visibility as seen by the engine.
    pub fn current(&self) -> Visibility {
        Visibility::from_visible(self.engine.is_visible())
    }

    /// Applies one observation. Returns `true` if it was a transition.
    pub async fn observe(&self, visibility: Visibility) -> bool {
        apply(&self.engine.inner, visibility).await
    }

    /// Follows a visibility stream until the sender is dropped or the engine is dropped.
    ///
    /// The current value of `rx` is applied first.
    pub fn spawn_listener(&self, mut rx: watch::Receiver<Visibility>) -> JoinHandle<()> {
        let weak: Weak<EngineInner> = Arc::downgrade(&self.engine.inner);
        let token = self.engine.inner.shutdown.clone();

        tokio::spawn(async move {
            let mut next = *rx.borrow_and_update();
            loop {
                match weak.upgrade() {
                    Some(inner) => {
                        apply(&inner, next).await;
                    }
                    None => return,
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        next = *rx.borrow_and_update();
                    }
                }
            }
        })
    }
}

async fn apply(inner: &Arc<EngineInner>, visibility: Visibility) -> bool {
    let visible = visibility.is_foreground();
    if inner.state.swap_visible(visible) == visible {
        return false;
    }
    inner
        .bus
        .publish(Event::new(EventKind::VisibilityChanged).with_visible(visible));

    if visible {
        inner.poll_now().await;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_visible_flag() {
        assert_eq!(Visibility::from_visible(true), Visibility::Foreground);
        assert_eq!(Visibility::from_visible(false), Visibility::Background);
        assert!(Visibility::default().is_foreground());
    }
}
