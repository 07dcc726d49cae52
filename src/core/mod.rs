//! Runtime core: scheduling and lifecycle.
//!
//! The public API from this module is [`Engine`] (with its [`EngineBuilder`],
//! [`Disposer`] and [`VisibilityTracker`]) and the [`EngineConfig`] it is built from.
//!
//! Internal modules:
//! - [`runner`]: executes one fetch with timeout/cancellation and event publishing;
//! - [`poller`]: per-resource loop with interval scheduling and backoff;
//! - [`registry`]: name → poller handle, drained by `stop`;
//! - [`state`]: active/visible/multiplier flags shared by every loop;
//! - [`engine`]: lifecycle facade;
//! - [`visibility`]: foreground/background signal.

mod builder;
mod config;
mod engine;
mod poller;
mod registry;
mod runner;
mod state;
mod visibility;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::{Disposer, Engine};
pub use visibility::{Visibility, VisibilityTracker};
