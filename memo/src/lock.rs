//! Memo strategy guarding the table with a sharded lock instead of an owner.
//!
//! Looking a key up and inserting its pending entry happen under the same
//! shard lock, so exactly one caller ever sees the key as absent and starts
//! its worker. The computation itself runs outside of the lock and callers
//! wait on the entry, never on the lock.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as TableEntry;
use memo_core::{Compute, MemoKey, Memoize};
use smol_str::SmolStr;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::config::MemoConfig;
use crate::entry::{self, Entry};
use crate::error::{MemoError, MemoResult};
use crate::{metrics, worker};

struct LockInner<K, C>
where
    C: Compute<K>,
{
    name: SmolStr,
    runtime: Handle,
    compute: Arc<C>,
    table: DashMap<K, Entry<C::Value, C::Error>>,
}

/// A memoizing cache sharing its table behind a sharded lock.
///
/// Offers the same guarantees as [`Memo`](crate::Memo): one computation per
/// key, one outcome for every caller, failures cached for good. It has no
/// owner task and therefore no shutdown; it lives as long as its clones.
pub struct LockMemo<K, C>
where
    C: Compute<K>,
{
    inner: Arc<LockInner<K, C>>,
}

impl<K, C> Clone for LockMemo<K, C>
where
    C: Compute<K>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, C> fmt::Debug for LockMemo<K, C>
where
    K: MemoKey,
    C: Compute<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockMemo")
            .field("name", &self.inner.name)
            .field("entries", &self.inner.table.len())
            .finish()
    }
}

impl<K, C> LockMemo<K, C>
where
    K: MemoKey,
    C: Compute<K>,
    C::Value: Clone + Sync,
{
    /// Create a memo over `compute`, spawning workers on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(compute: C) -> Self {
        Self::with_config(MemoConfig::default(), Handle::current(), compute)
    }

    /// Create a memo over `compute`, spawning workers on `runtime`.
    pub fn with_config(config: MemoConfig, runtime: Handle, compute: C) -> Self {
        Self {
            inner: Arc::new(LockInner {
                name: config.name,
                runtime,
                compute: Arc::new(compute),
                table: DashMap::with_capacity(config.initial_capacity),
            }),
        }
    }

    /// Return the memoized outcome for `key`, computing it if this is the
    /// first request for the key.
    pub async fn get(&self, key: K) -> MemoResult<C::Value, C::Error> {
        metrics::record_request(&self.inner.name);

        // The shard guard must be released before awaiting anything.
        let (entry, writer) = match self.inner.table.entry(key.clone()) {
            TableEntry::Occupied(occupied) => (occupied.get().clone(), None),
            TableEntry::Vacant(vacant) => {
                let (writer, entry) = entry::pending();
                vacant.insert(entry.clone());
                (entry, Some(writer))
            }
        };

        match writer {
            Some(writer) => {
                debug!(?key, "first request for key, starting worker");
                metrics::record_entry_created(&self.inner.name, self.inner.table.len());
                worker::spawn(
                    &self.inner.runtime,
                    &self.inner.name,
                    Arc::clone(&self.inner.compute),
                    key,
                    writer,
                );
            }
            None => trace!(?key, ready = entry.is_ready(), "entry already present"),
        }

        let result = entry.wait().await;
        metrics::record_delivery(&self.inner.name);
        result
    }

    /// Returns the number of keys seen so far.
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns `true` if no key has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.inner.table.is_empty()
    }

    /// Returns the name of this memo.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

#[async_trait]
impl<K, C> Memoize<K> for LockMemo<K, C>
where
    K: MemoKey,
    C: Compute<K>,
    C::Value: Clone + Sync,
{
    type Value = C::Value;
    type Error = MemoError<C::Error>;

    async fn get(&self, key: K) -> Result<Self::Value, Self::Error> {
        LockMemo::get(self, key).await
    }
}
