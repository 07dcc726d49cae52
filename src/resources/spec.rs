//! # Resource specification.
//!
//! [`ResourceSpec`] bundles a named [`Resource`](crate::Resource) with its polling
//! parameters. Specs are handed to [`Engine::start`](crate::Engine::start); names
//! are the registry keys, so a later spec with the same name replaces an earlier one.
//!
//! ## Rules
//! - A missing or zero interval means "use `EngineConfig::default_interval`".
//! - A missing timeout means "use `EngineConfig::fetch_timeout`".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::resources::resource::{Deliver, ResourceRef};
use crate::resources::resource_fn::ResourceFn;

/// Named resource plus its polling parameters.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use pollvisor::{FetchError, ResourceSpec};
///
/// let spec = ResourceSpec::from_fn(
///     "orders",
///     || async { Ok::<_, FetchError>(vec!["o-1", "o-2"]) },
///     |records: Vec<&'static str>| println!("{records:?}"),
/// )
/// .with_interval(Duration::from_secs(5));
///
/// assert_eq!(spec.name(), "orders");
/// assert_eq!(spec.interval(), Some(Duration::from_secs(5)));
/// ```
#[derive(Clone)]
pub struct ResourceSpec {
    name: Arc<str>,
    resource: ResourceRef,
    interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl ResourceSpec {
    /// Creates a spec for an existing resource handle.
    pub fn new(name: impl Into<Arc<str>>, resource: ResourceRef) -> Self {
        Self {
            name: name.into(),
            resource,
            interval: None,
            timeout: None,
        }
    }

    /// Creates a spec from a fetch closure and a delivery sink.
    pub fn from_fn<T, F, Fut, E>(
        name: impl Into<Arc<str>>,
        fetch: F,
        deliver: impl Deliver<T>,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        E: Into<FetchError> + 'static,
    {
        let resource: ResourceFn<T, F, E> = ResourceFn::new(fetch, deliver);
        Self::new(name, resource.into_ref())
    }

    /// Returns a new spec with the given base interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Returns a new spec with the given per-fetch timeout (`None` = inherit).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared resource handle.
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Configured base interval, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Configured fetch timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl std::fmt::Debug for ResourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSpec")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
