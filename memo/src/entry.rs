//! Per-key result slot with a one-shot ready signal.
//!
//! An entry starts out pending and becomes ready exactly once, when its
//! [`EntryWriter`] is fulfilled. The writer is consumed by fulfilling, so the
//! result is write-once by construction. Any number of [`Entry`] clones may
//! wait for the result concurrently; observing it never consumes or resets
//! the signal.

use tokio::sync::watch;

use crate::error::{MemoError, MemoResult};

type Slot<V, E> = Option<MemoResult<V, E>>;

/// Read side of a per-key result slot.
pub(crate) struct Entry<V, E> {
    ready: watch::Receiver<Slot<V, E>>,
}

/// Write side of a per-key result slot, owned by the key's worker.
pub(crate) struct EntryWriter<V, E> {
    slot: watch::Sender<Slot<V, E>>,
}

/// Create a pending entry and its single writer.
pub(crate) fn pending<V, E>() -> (EntryWriter<V, E>, Entry<V, E>) {
    let (slot, ready) = watch::channel(None);
    (EntryWriter { slot }, Entry { ready })
}

impl<V, E> Clone for Entry<V, E> {
    fn clone(&self) -> Self {
        Self {
            ready: self.ready.clone(),
        }
    }
}

impl<V, E> Entry<V, E>
where
    V: Clone,
{
    /// Returns `true` once the result has been written.
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.borrow().is_some()
    }

    /// Wait until the entry is ready and return a clone of its result.
    ///
    /// Resolves to [`MemoError::Aborted`] if the writer was dropped without
    /// a result, which happens when the runtime running the worker shuts
    /// down mid-computation.
    pub(crate) async fn wait(&self) -> MemoResult<V, E> {
        let mut ready = self.ready.clone();
        let Ok(slot) = ready.wait_for(Option::is_some).await else {
            return Err(MemoError::Aborted);
        };
        match &*slot {
            Some(result) => result.clone(),
            None => unreachable!("memo entry signalled ready without a result"),
        }
    }
}

impl<V, E> EntryWriter<V, E> {
    /// Store the result and wake every waiter.
    pub(crate) fn fulfill(self, result: MemoResult<V, E>) {
        self.slot.send_replace(Some(result));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;

    #[tokio::test]
    async fn waiters_before_and_after_fulfill_see_the_same_result() {
        let (writer, entry) = pending::<u32, String>();
        assert!(!entry.is_ready());

        let early: Vec<_> = (0..8)
            .map(|_| {
                let entry = entry.clone();
                tokio::spawn(async move { entry.wait().await })
            })
            .collect();

        writer.fulfill(Ok(7));
        assert!(entry.is_ready());

        for result in join_all(early).await {
            assert_eq!(result.unwrap(), Ok(7));
        }
        // Observing the signal does not consume it.
        assert_eq!(entry.wait().await, Ok(7));
        assert_eq!(entry.clone().wait().await, Ok(7));
    }

    #[tokio::test]
    async fn errors_are_shared_not_copied() {
        let (writer, entry) = pending::<u32, String>();
        writer.fulfill(Err(MemoError::Compute(Arc::new("nope".to_owned()))));

        let (first, second) = (entry.wait().await, entry.wait().await);
        match (first, second) {
            (Err(MemoError::Compute(a)), Err(MemoError::Compute(b))) => {
                assert!(Arc::ptr_eq(&a, &b))
            }
            other => panic!("unexpected results: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_writer_aborts_waiters() {
        let (writer, entry) = pending::<u32, String>();
        let waiter = {
            let entry = entry.clone();
            tokio::spawn(async move { entry.wait().await })
        };

        drop(writer);

        assert_eq!(waiter.await.unwrap(), Err(MemoError::Aborted));
        assert_eq!(entry.wait().await, Err(MemoError::Aborted));
        assert!(!entry.is_ready());
    }
}
