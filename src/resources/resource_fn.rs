//! # Function-backed resource (`ResourceFn`)
//!
//! [`ResourceFn`] wraps a fetch closure `F: Fn() -> Fut` and a delivery sink,
//! producing a fresh future per fetch. Shared state between fetches goes in an
//! explicit `Arc<...>` captured by the closure.
//!
//! The closure may fail with any error that converts into [`FetchError`],
//! including [`RawFailure`](crate::RawFailure), which is classified on the way.
//!
//! ## Example
//! ```rust
//! use pollvisor::{RawFailure, ResourceFn, ResourceRef};
//!
//! let orders: ResourceFn<u64, _, RawFailure> = ResourceFn::new(
//!     || async { Ok::<_, RawFailure>(vec![1u64, 2, 3]) },
//!     |records: Vec<u64>| println!("{} orders", records.len()),
//! );
//! let _shared: ResourceRef = orders.into_ref();
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::FetchError;
use crate::resources::resource::{BoxFetchFuture, Deliver, Resource, ResourceRef, Snapshot};

/// Function-backed resource implementation.
pub struct ResourceFn<T, F, E = FetchError> {
    fetch: F,
    sink: Arc<dyn Deliver<T>>,
    _err: PhantomData<fn() -> E>,
}

impl<T, F, E> ResourceFn<T, F, E>
where
    T: Send + 'static,
{
    /// Creates a resource from a fetch closure and a delivery sink.
    pub fn new(fetch: F, deliver: impl Deliver<T>) -> Self {
        Self::with_sink(fetch, Arc::new(deliver))
    }

    /// Creates a resource that delivers into an already shared sink.
    pub fn with_sink(fetch: F, sink: Arc<dyn Deliver<T>>) -> Self {
        Self {
            fetch,
            sink,
            _err: PhantomData,
        }
    }
}

impl<T, F, Fut, E> ResourceFn<T, F, E>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
    E: Into<FetchError> + 'static,
{
    /// Converts into a shared handle (`Arc<dyn Resource>`).
    pub fn into_ref(self) -> ResourceRef {
        Arc::new(self)
    }
}

impl<T, F, Fut, E> Resource for ResourceFn<T, F, E>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
    E: Into<FetchError> + 'static,
{
    fn fetch(&self) -> BoxFetchFuture {
        let fut = (self.fetch)();
        let sink = Arc::clone(&self.sink);
        Box::pin(async move {
            let records = fut.await.map_err(Into::into)?;
            Ok(Snapshot::new(records, sink))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resources::RawFailure;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn each_fetch_runs_the_closure_again() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let res: ResourceFn<u32, _> = ResourceFn::new(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, FetchError>(vec![n]) }
            },
            |_records: Vec<u32>| {},
        );

        assert_eq!(res.fetch().await.unwrap().len(), 1);
        assert_eq!(res.fetch().await.unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn raw_failures_are_classified_at_the_boundary() {
        let res: ResourceFn<u32, _, RawFailure> = ResourceFn::new(
            || async { Err(RawFailure::new(Some(429), "Too Many Requests")) },
            |_records: Vec<u32>| {},
        );
        let err = res.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitOrExhaustion);
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn snapshot_goes_to_the_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let res: ResourceFn<&'static str, _> = ResourceFn::new(
            || async { Ok::<_, FetchError>(vec!["a", "b"]) },
            move |records: Vec<&'static str>| sink_seen.lock().unwrap().extend(records),
        );

        res.fetch().await.unwrap().deliver().await;
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }
}
