//! # Resource abstractions and specifications.
//!
//! This module provides the resource-related types:
//! - [`Resource`] - trait for anything that can fetch a complete snapshot
//! - [`Deliver`] - sink receiving snapshots (any `Fn(Vec<T>)` closure qualifies)
//! - [`Snapshot`] - type-erased fetched records bundled with their sink
//! - [`ResourceFn`] - closure-backed resource
//! - [`ResourceSpec`] - named resource plus interval/timeout
//! - [`RawFailure`], [`ErrorClassifier`], [`MarkerClassifier`] - fetch error adapter

mod classify;
mod resource;
mod resource_fn;
mod spec;

pub use classify::{ErrorClassifier, MarkerClassifier, RawFailure};
pub use resource::{BoxFetchFuture, Deliver, Resource, ResourceRef, Snapshot};
pub use resource_fn::ResourceFn;
pub use spec::ResourceSpec;
