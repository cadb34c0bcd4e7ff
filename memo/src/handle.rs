//! Caller-facing handle to a running memo.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use memo_core::{Compute, MemoKey, MemoValue, Memoize};
use smol_str::SmolStr;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, info, info_span};

use crate::config::{MemoBuilder, MemoConfig};
use crate::error::{MemoError, MemoResult};
use crate::metrics;
use crate::owner::{Message, Owner, Request};

struct Inner<K, V, E> {
    name: SmolStr,
    requests: mpsc::UnboundedSender<Message<K, V, E>>,
    closed: AtomicBool,
    exited: watch::Receiver<()>,
}

/// A concurrent memoizing cache.
///
/// `Memo` remembers the outcome of an expensive computation for every key it
/// is asked for. However many callers ask for a key, and whenever they ask,
/// the computation runs at most once for it and all of them observe the same
/// outcome. Failures are outcomes too: an error (or a panic) is cached for the
/// key just like a value and is never retried.
///
/// Lookups for different keys never wait on each other. The table of entries
/// belongs to a single owner task; a `Memo` only sends it requests and waits
/// for the reply, so no lock is held around the table.
///
/// Cloning a `Memo` is cheap and every clone talks to the same owner. Entries
/// are never evicted.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use memo::Memo;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let memo = Memo::new(move |word: String| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     async move { Ok::<_, std::io::Error>(word.len()) }
/// });
///
/// assert_eq!(memo.get("memo".to_owned()).await.unwrap(), 4);
/// assert_eq!(memo.get("memo".to_owned()).await.unwrap(), 4);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// # }
/// ```
pub struct Memo<K, V, E> {
    inner: Arc<Inner<K, V, E>>,
}

impl<K, V, E> Clone for Memo<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E> fmt::Debug for Memo<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.inner.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Memo<(), (), ()> {
    /// Creates a new [`MemoBuilder`].
    pub fn builder() -> MemoBuilder {
        MemoBuilder::new()
    }
}

impl<K, V, E> Memo<K, V, E>
where
    K: MemoKey,
    V: MemoValue,
    E: Send + Sync + 'static,
{
    /// Create a memo over `compute` with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new<C>(compute: C) -> Self
    where
        C: Compute<K, Value = V, Error = E>,
    {
        MemoBuilder::new().build(compute)
    }

    pub(crate) fn start<C>(config: MemoConfig, runtime: Handle, compute: C) -> Self
    where
        C: Compute<K, Value = V, Error = E>,
    {
        let (requests, inbox) = mpsc::unbounded_channel();
        let (exited_tx, exited) = watch::channel(());
        let MemoConfig {
            name,
            initial_capacity,
        } = config;

        let owner = Owner::new(
            name.clone(),
            runtime.clone(),
            compute,
            initial_capacity,
            inbox,
            exited_tx,
        );
        let span = info_span!("memo_owner", memo = %name);
        runtime.spawn(owner.run().instrument(span));

        Self {
            inner: Arc::new(Inner {
                name,
                requests,
                closed: AtomicBool::new(false),
                exited,
            }),
        }
    }

    /// Return the memoized outcome for `key`, computing it if this is the
    /// first request for the key.
    ///
    /// Fails with [`MemoError::Closed`] once [`shutdown`](Self::shutdown)
    /// has been called. Dropping the returned future does not cancel the
    /// computation; its outcome is still cached.
    pub async fn get(&self, key: K) -> MemoResult<V, E> {
        let response = self.submit(key)?;
        response.await.unwrap_or(Err(MemoError::Closed))
    }

    /// Blocking version of [`get`](Self::get), for callers that are not
    /// running on the async runtime.
    ///
    /// # Panics
    ///
    /// Panics if called within an asynchronous execution context.
    pub fn blocking_get(&self, key: K) -> MemoResult<V, E> {
        let response = self.submit(key)?;
        response.blocking_recv().unwrap_or(Err(MemoError::Closed))
    }

    fn submit(&self, key: K) -> Result<oneshot::Receiver<MemoResult<V, E>>, MemoError<E>> {
        if self.is_closed() {
            metrics::record_rejected(&self.inner.name);
            return Err(MemoError::Closed);
        }
        let (respond_to, response) = oneshot::channel();
        self.inner
            .requests
            .send(Message::Get(Request { key, respond_to }))
            .map_err(|_| MemoError::Closed)?;
        Ok(response)
    }

    /// Stop accepting lookups.
    ///
    /// Lookups issued before this call are still answered; lookups issued
    /// afterwards fail immediately with [`MemoError::Closed`]. Computations
    /// already running are not cancelled. Calling it again has no effect.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(memo = %self.inner.name, "memo shutdown requested");
        // The owner is gone already if every other way of reaching it is.
        let _ = self.inner.requests.send(Message::Shutdown);
    }
}

impl<K, V, E> Memo<K, V, E> {
    /// Returns the name of this memo.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Wait until the owner task has stopped.
    ///
    /// Resolves after [`shutdown`](Self::shutdown) once everything queued
    /// before it has been dispatched. Deliveries of results still being
    /// computed continue after this resolves.
    pub async fn closed(&self) {
        let mut exited = self.inner.exited.clone();
        while exited.changed().await.is_ok() {}
    }
}

#[async_trait]
impl<K, V, E> Memoize<K> for Memo<K, V, E>
where
    K: MemoKey,
    V: MemoValue,
    E: Send + Sync + 'static,
{
    type Value = V;
    type Error = MemoError<E>;

    async fn get(&self, key: K) -> Result<V, MemoError<E>> {
        Memo::get(self, key).await
    }
}
