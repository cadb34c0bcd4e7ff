//! Shared helpers for memo integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use memo::Compute;

/// Error returned by [`CountingCompute`] for keys starting with `fail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError(pub String);

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to fetch {}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// Computation counting its invocations, per key and in total.
///
/// The value for a key is `"value of <key>"`. Keys starting with `fail`
/// produce a [`FetchError`], keys starting with `panic` panic.
#[derive(Clone, Default)]
pub struct CountingCompute {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every computation sleep for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Total number of computations started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Compute<String> for CountingCompute {
    type Value = String;
    type Error = FetchError;
    type Future = BoxFuture<'static, Result<String, FetchError>>;

    fn compute(&self, key: String) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if key.starts_with("panic") {
                panic!("cannot compute {key}");
            }
            if key.starts_with("fail") {
                return Err(FetchError(key));
            }
            Ok(format!("value of {key}"))
        }
        .boxed()
    }
}

/// Keys from a workload where some repeat: five distinct keys out of eight.
pub fn repeating_keys() -> Vec<String> {
    ["a", "b", "c", "d", "a", "b", "c", "e"]
        .into_iter()
        .map(String::from)
        .collect()
}
