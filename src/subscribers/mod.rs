//! # Event subscribers.
//!
//! Subscribers are the observability sink of the engine. Every failure is
//! reported here (with resource, attempt, classified kind and computed delay)
//! instead of being returned from `start`/`stop`/`poll_now`.
//!
//! ```text
//! Poller ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                        ├──► LogWriter (tracing)
//!                                                        └──► user Subscribe impls
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
