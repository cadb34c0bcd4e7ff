//! Per-key task running the memoized computation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use memo_core::{Compute, MemoKey};
use smol_str::SmolStr;
use tokio::runtime::Handle;
use tracing::{Instrument, debug, debug_span, warn};

use crate::entry::EntryWriter;
use crate::error::MemoError;
use crate::metrics;

/// Spawn the worker computing `key` and fulfilling `writer` with the outcome.
///
/// Must be called at most once per key: the caller is responsible for having
/// recorded the key's entry before the worker starts.
pub(crate) fn spawn<K, C>(
    runtime: &Handle,
    name: &SmolStr,
    compute: Arc<C>,
    key: K,
    writer: EntryWriter<C::Value, C::Error>,
) where
    K: MemoKey,
    C: Compute<K>,
    C::Value: Sync,
{
    let span = debug_span!("memo_worker", memo = %name, key = ?key);
    let name = name.clone();
    runtime.spawn(run(name, compute, key, writer).instrument(span));
}

async fn run<K, C>(name: SmolStr, compute: Arc<C>, key: K, writer: EntryWriter<C::Value, C::Error>)
where
    K: MemoKey,
    C: Compute<K>,
    C::Value: Sync,
{
    let start = Instant::now();
    let computation = async move { compute.compute(key).await };

    // A panicking computation is an outcome like any other: it is cached for
    // the key and never takes down the owner or other workers.
    let result = match AssertUnwindSafe(computation).catch_unwind().await {
        Ok(Ok(value)) => {
            debug!("computation finished");
            Ok(value)
        }
        Ok(Err(err)) => {
            debug!("computation failed, caching the error");
            Err(MemoError::Compute(Arc::new(err)))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(panic = %message, "computation panicked, caching the panic");
            Err(MemoError::Panicked(message))
        }
    };

    metrics::record_computation(&name, start.elapsed(), result.is_err());
    writer.fulfill(result);
}

fn panic_message(payload: &(dyn Any + Send)) -> Arc<str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Arc::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Arc::from(message.as_str())
    } else {
        Arc::from("Box<dyn Any>")
    }
}
