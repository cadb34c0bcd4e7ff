use std::sync::Arc;

use thiserror::Error;

/// Error type returned by memo lookups.
///
/// [`Compute`](MemoError::Compute), [`Panicked`](MemoError::Panicked) and
/// [`Aborted`](MemoError::Aborted) are outcomes of a key's computation: they
/// are cached exactly like a value and every caller for that key receives the
/// same error, now and later.
/// [`Closed`](MemoError::Closed) is never cached.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoError<E> {
    /// The computation returned an error.
    ///
    /// The error is shared, so all callers observe the very same instance.
    #[error("computation failed: {0}")]
    Compute(Arc<E>),

    /// The computation panicked. Holds the panic message.
    #[error("computation panicked: {0}")]
    Panicked(Arc<str>),

    /// The computation was dropped before it finished, because the runtime
    /// running it shut down. Cached for the key like any other failure.
    #[error("computation aborted before completion")]
    Aborted,

    /// The memo was shut down before the request was accepted.
    #[error("memo is closed")]
    Closed,
}

impl<E> MemoError<E> {
    /// Returns `true` for [`MemoError::Closed`].
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the computation's own error, if that is what failed.
    pub fn compute_error(&self) -> Option<&E> {
        match self {
            Self::Compute(err) => Some(err),
            _ => None,
        }
    }
}

impl<E> Clone for MemoError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Compute(err) => Self::Compute(Arc::clone(err)),
            Self::Panicked(message) => Self::Panicked(Arc::clone(message)),
            Self::Aborted => Self::Aborted,
            Self::Closed => Self::Closed,
        }
    }
}

/// Result of a memo lookup.
pub type MemoResult<V, E> = Result<V, MemoError<E>>;
