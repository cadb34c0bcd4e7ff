//! Per-request task forwarding an entry's result to the requester.

use smol_str::SmolStr;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::trace;

use crate::entry::Entry;
use crate::error::MemoResult;
use crate::metrics;

/// Private response conduit of a single request.
pub(crate) type Responder<V, E> = oneshot::Sender<MemoResult<V, E>>;

/// Spawn a deliverer that waits for `entry` and answers `respond_to`.
pub(crate) fn spawn<V, E>(
    runtime: &Handle,
    name: &SmolStr,
    entry: Entry<V, E>,
    respond_to: Responder<V, E>,
) where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let name = name.clone();
    runtime.spawn(async move {
        let result = entry.wait().await;
        // A requester that stopped waiting dropped its receiver; there is
        // nobody left to answer.
        if respond_to.send(result).is_err() {
            trace!(memo = %name, "requester went away before delivery");
        } else {
            metrics::record_delivery(&name);
        }
    });
}
