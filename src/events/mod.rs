//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish
//! and observe everything the engine does.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`FetchSource`] event classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Engine` (start/stop/knobs), `Registry`, `Poller`,
//!   `runner::fetch_once`, `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the engine's listener task, which forwards to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, FetchSource};
