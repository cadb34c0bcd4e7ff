//! The task owning the cache table.
//!
//! The owner is the only code that ever reads or writes the table. Requests
//! reach it through an unbounded queue and are handled strictly one at a
//! time, which makes "is this key new?" and "record the key, start its
//! worker" a single step: a request arriving later for the same key always
//! finds the entry. Handling a request never waits on a computation or a
//! delivery, so unrelated keys never queue up behind each other.

use std::collections::HashMap;
use std::collections::hash_map::Entry as TableEntry;
use std::sync::Arc;

use memo_core::{Compute, MemoKey};
use smol_str::SmolStr;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use crate::deliverer::{self, Responder};
use crate::entry::{self, Entry};
use crate::error::MemoError;
use crate::{metrics, worker};

/// A lookup for `key`, answered on `respond_to`.
pub(crate) struct Request<K, V, E> {
    pub(crate) key: K,
    pub(crate) respond_to: Responder<V, E>,
}

/// Messages understood by the owner.
pub(crate) enum Message<K, V, E> {
    Get(Request<K, V, E>),
    /// Stop accepting requests once everything queued so far is dispatched.
    Shutdown,
}

pub(crate) type Inbox<K, V, E> = mpsc::UnboundedReceiver<Message<K, V, E>>;

pub(crate) struct Owner<K, C>
where
    K: MemoKey,
    C: Compute<K>,
{
    name: SmolStr,
    runtime: Handle,
    compute: Arc<C>,
    table: HashMap<K, Entry<C::Value, C::Error>>,
    inbox: Inbox<K, C::Value, C::Error>,
    // Dropped when `run` returns, which is what `Memo::closed` waits for.
    _exited: watch::Sender<()>,
}

impl<K, C> Owner<K, C>
where
    K: MemoKey,
    C: Compute<K>,
    C::Value: Clone + Sync,
{
    pub(crate) fn new(
        name: SmolStr,
        runtime: Handle,
        compute: C,
        initial_capacity: usize,
        inbox: Inbox<K, C::Value, C::Error>,
        exited: watch::Sender<()>,
    ) -> Self {
        Self {
            name,
            runtime,
            compute: Arc::new(compute),
            table: HashMap::with_capacity(initial_capacity),
            inbox,
            _exited: exited,
        }
    }

    /// Serve requests until shutdown, or until every handle is gone.
    pub(crate) async fn run(mut self) {
        debug!("memo owner started");
        while let Some(message) = self.inbox.recv().await {
            match message {
                Message::Get(request) => self.dispatch(request),
                Message::Shutdown => {
                    info!(entries = self.table.len(), "memo shutting down");
                    self.drain().await;
                    break;
                }
            }
        }
        debug!(entries = self.table.len(), "memo owner stopped");
    }

    fn dispatch(&mut self, Request { key, respond_to }: Request<K, C::Value, C::Error>) {
        metrics::record_request(&self.name);

        let entry = match self.table.entry(key) {
            TableEntry::Occupied(occupied) => {
                let entry = occupied.get().clone();
                trace!(
                    key = ?occupied.key(),
                    ready = entry.is_ready(),
                    "entry already present"
                );
                entry
            }
            TableEntry::Vacant(vacant) => {
                let key = vacant.key().clone();
                let (writer, entry) = entry::pending();
                vacant.insert(entry.clone());
                debug!(?key, "first request for key, starting worker");
                metrics::record_entry_created(&self.name, self.table.len());
                worker::spawn(
                    &self.runtime,
                    &self.name,
                    Arc::clone(&self.compute),
                    key,
                    writer,
                );
                entry
            }
        };

        deliverer::spawn(&self.runtime, &self.name, entry, respond_to);
    }

    /// Refuse whatever was queued after the shutdown message.
    async fn drain(&mut self) {
        self.inbox.close();
        while let Some(message) = self.inbox.recv().await {
            if let Message::Get(Request { key, respond_to }) = message {
                trace!(?key, "rejecting request queued after shutdown");
                metrics::record_rejected(&self.name);
                // The requester may already have given up.
                let _ = respond_to.send(Err(MemoError::Closed));
            }
        }
    }
}
