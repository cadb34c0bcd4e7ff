use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

/// Bounds required of a memo key.
///
/// Keys are opaque to the cache: they are only hashed, compared, cloned into
/// the task computing them, and printed in logs.
pub trait MemoKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> MemoKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Bounds required of a memoized value.
///
/// Every caller receives its own clone of the single computed value, so
/// large values are best wrapped in `Arc` or a cheaply cloneable buffer.
pub trait MemoValue: Clone + Send + Sync + 'static {}

impl<T> MemoValue for T where T: Clone + Send + Sync + 'static {}

/// Caller-facing contract of a memoizing cache.
///
/// Implementations guarantee that the underlying computation runs at most
/// once per key and that every caller for a key observes the same outcome,
/// including a failed one.
#[async_trait]
pub trait Memoize<K>: Send + Sync
where
    K: MemoKey,
{
    /// The memoized value.
    type Value: MemoValue;

    /// The error returned by [`Memoize::get`].
    type Error: Send;

    /// Return the memoized outcome for `key`, computing it first if this is
    /// the first request for the key.
    async fn get(&self, key: K) -> Result<Self::Value, Self::Error>;
}
