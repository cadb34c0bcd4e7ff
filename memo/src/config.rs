//! Memo configuration and builder.

use memo_core::{Compute, MemoKey};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::runtime::Handle;

use crate::Memo;

/// Default name used in tracing spans and metric labels.
pub const DEFAULT_NAME: &str = "memo";

/// Serializable part of a memo's configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MemoConfig {
    /// Label used in tracing spans and metric labels.
    #[serde(default = "default_name")]
    pub name: SmolStr,
    /// Number of keys the table can hold before it first reallocates.
    #[serde(default)]
    pub initial_capacity: usize,
}

fn default_name() -> SmolStr {
    SmolStr::new_static(DEFAULT_NAME)
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            initial_capacity: 0,
        }
    }
}

impl MemoConfig {
    /// Create a new builder for a memo.
    pub fn builder() -> MemoBuilder {
        MemoBuilder::default()
    }
}

/// Builder for [`Memo`].
///
/// Use [`Memo::builder()`] to create a new builder.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use memo::Memo;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let memo = Memo::builder()
///     .name("squares")
///     .initial_capacity(64)
///     .build(|n: u64| async move { Ok::<_, Infallible>(n * n) });
///
/// assert_eq!(memo.get(12).await, Ok(144));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoBuilder {
    config: MemoConfig,
    runtime: Option<Handle>,
}

impl MemoBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(self, config: MemoConfig) -> Self {
        Self { config, ..self }
    }

    /// Set the name used in tracing spans and metric labels.
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the initial capacity of the table.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Set the runtime the owner, workers and deliverers are spawned on.
    ///
    /// Defaults to the runtime [`build`](Self::build) is called from.
    pub fn runtime(self, runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
            ..self
        }
    }

    /// Build the memo and start its owner task.
    ///
    /// # Panics
    ///
    /// Panics if no runtime was set and this is called outside of a Tokio
    /// runtime.
    pub fn build<K, C>(self, compute: C) -> Memo<K, C::Value, C::Error>
    where
        K: MemoKey,
        C: Compute<K>,
        C::Value: Clone + Sync,
    {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        Memo::start(self.config, runtime, compute)
    }
}
