use std::future::Future;

/// Trait for the expensive computation being memoized.
///
/// A memo invokes [`Compute::compute`] at most once per key, from a task of
/// its own, so implementations must be safe to run concurrently with
/// themselves for different keys. Any `Fn(K) -> impl Future<Output = Result<V, E>>`
/// closure implements this trait.
///
/// # Examples
///
/// ```rust
/// use memo_core::Compute;
///
/// struct Length;
///
/// impl Compute<String> for Length {
///     type Value = usize;
///     type Error = std::convert::Infallible;
///     type Future = std::future::Ready<Result<usize, Self::Error>>;
///
///     fn compute(&self, key: String) -> Self::Future {
///         std::future::ready(Ok(key.len()))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// assert_eq!(Length.compute("four".to_owned()).await, Ok(4));
/// # }
/// ```
pub trait Compute<K>: Send + Sync + 'static {
    /// The value produced for a key.
    type Value: Send + 'static;

    /// The error returned when the computation fails.
    type Error: Send + Sync + 'static;

    /// The future that resolves to the outcome of the computation.
    type Future: Future<Output = Result<Self::Value, Self::Error>> + Send + 'static;

    /// Compute the value for `key`.
    fn compute(&self, key: K) -> Self::Future;
}

impl<K, F, Fut, V, E> Compute<K> for F
where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: Send + 'static,
    E: Send + Sync + 'static,
{
    type Value = V;
    type Error = E;
    type Future = Fut;

    fn compute(&self, key: K) -> Self::Future {
        (self)(key)
    }
}
