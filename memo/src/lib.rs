#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Memo configuration.
///
/// Provides [`MemoConfig`](config::MemoConfig), the serializable settings of
/// a memo, and [`MemoBuilder`](config::MemoBuilder) to start one.
pub mod config;

/// Error types for memo lookups.
///
/// Defines [`MemoError`] which covers:
/// - Errors returned by the computation (cached per key)
/// - Panics raised by the computation (cached per key)
/// - Lookups issued after shutdown
pub mod error;

/// Memo strategy without an owner task.
///
/// [`LockMemo`](lock::LockMemo) shares the table behind a sharded lock and
/// makes the check-and-insert of a pending entry a single critical section.
pub mod lock;

/// Metrics collection for memo observability.
///
/// When the `metrics` feature is enabled, this module provides counters,
/// a gauge and a histogram for:
/// - Lookups dispatched and refused
/// - Computations run, failed, and their duration
/// - Results delivered
pub mod metrics;

mod deliverer;
mod entry;
mod handle;
mod owner;
mod worker;

pub use config::{MemoBuilder, MemoConfig};
pub use error::{MemoError, MemoResult};
pub use handle::Memo;
pub use lock::LockMemo;
pub use memo_core::{Compute, MemoKey, MemoValue, Memoize};

/// The `memo` prelude.
///
/// ```rust
/// use memo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Compute, Memo, MemoError, Memoize};
}
