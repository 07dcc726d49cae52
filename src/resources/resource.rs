//! # Resource abstraction.
//!
//! A [`Resource`] produces one fresh future per fetch. A successful fetch yields
//! a [`Snapshot`]: the complete record list bundled with the resource's delivery
//! sink, so the engine can hand it over without knowing the record type.
//!
//! The engine never looks inside a snapshot beyond its length.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::FetchError;

/// Boxed future returned by [`Resource::fetch`].
pub type BoxFetchFuture = Pin<Box<dyn Future<Output = Result<Snapshot, FetchError>> + Send + 'static>>;

/// Shared handle to a resource.
pub type ResourceRef = Arc<dyn Resource>;

/// # A remote feed of records that can be fetched on demand.
///
/// Each call to [`fetch`](Resource::fetch) must start an independent request.
/// Most users build one with [`ResourceFn`](crate::ResourceFn) instead of
/// implementing this trait by hand.
pub trait Resource: Send + Sync + 'static {
    /// Starts one fetch of the complete snapshot.
    fn fetch(&self) -> BoxFetchFuture;
}

/// # Receiver of snapshots for one resource.
///
/// The callback owns merge/replace semantics; the engine performs no diffing.
/// Any `Fn(Vec<T>)` closure is a `Deliver<T>`; implement the trait directly for
/// asynchronous delivery.
///
/// A delivery must not call [`Engine::stop`](crate::Engine::stop) on the same
/// engine: `stop` waits for in-progress deliveries to finish.
#[async_trait]
pub trait Deliver<T>: Send + Sync + 'static {
    /// Receives the full snapshot.
    async fn deliver(&self, snapshot: Vec<T>);
}

#[async_trait]
impl<T, F> Deliver<T> for F
where
    T: Send + 'static,
    F: Fn(Vec<T>) + Send + Sync + 'static,
{
    async fn deliver(&self, snapshot: Vec<T>) {
        (self)(snapshot)
    }
}

/// A fetched snapshot, ready to be delivered.
pub struct Snapshot {
    len: usize,
    deliver: Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>,
}

impl Snapshot {
    /// Bundles `records` with the sink that should receive them.
    pub fn new<T: Send + 'static>(records: Vec<T>, sink: Arc<dyn Deliver<T>>) -> Self {
        let len = records.len();
        Self {
            len,
            deliver: Box::new(move || Box::pin(async move { sink.deliver(records).await })),
        }
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hands the records to the sink.
    pub(crate) async fn deliver(self) {
        (self.deliver)().await
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn snapshot_delivers_records_to_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: Arc<dyn Deliver<u32>> = Arc::new(move |records: Vec<u32>| {
            sink_seen.lock().unwrap().extend(records);
        });

        let snap = Snapshot::new(vec![1, 2, 3], sink);
        assert_eq!(snap.len(), 3);
        assert!(!snap.is_empty());
        snap.deliver().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    struct AsyncSink(tokio::sync::Mutex<usize>);

    #[async_trait]
    impl Deliver<String> for AsyncSink {
        async fn deliver(&self, snapshot: Vec<String>) {
            tokio::task::yield_now().await;
            *self.0.lock().await = snapshot.len();
        }
    }

    #[tokio::test]
    async fn snapshot_delivers_to_async_sink() {
        let sink = Arc::new(AsyncSink(tokio::sync::Mutex::new(0)));
        let snap = Snapshot::new(vec!["a".to_string(), "b".to_string()], sink.clone());
        snap.deliver().await;
        assert_eq!(*sink.0.lock().await, 2);
    }
}
