//! Behaviour shared by every memo strategy.
//!
//! Each check is written once against the `Memoize` trait and run for both
//! `Memo` and `LockMemo`.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{CountingCompute, FetchError, repeating_keys};
use futures::future::join_all;
use memo::{LockMemo, Memo, MemoError, Memoize};

trait TestMemo:
    Memoize<String, Value = String, Error = MemoError<FetchError>> + Clone + 'static
{
}

impl<T> TestMemo for T where
    T: Memoize<String, Value = String, Error = MemoError<FetchError>> + Clone + 'static
{
}

/// Fire one request per key, each from its own task, and collect the results.
async fn get_concurrently<M: TestMemo>(
    memo: &M,
    keys: Vec<String>,
) -> Vec<Result<String, MemoError<FetchError>>> {
    let tasks = keys.into_iter().map(|key| {
        let memo = memo.clone();
        tokio::spawn(async move { memo.get(key).await })
    });
    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("request task panicked"))
        .collect()
}

async fn computes_once_under_contention<M: TestMemo>(memo: M, compute: CountingCompute) {
    let results = get_concurrently(&memo, vec!["k".to_owned(); 100]).await;

    assert_eq!(compute.calls(), 1);
    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|r| r == &Ok("value of k".to_owned())));
}

async fn concurrent_failures_share_one_error<M: TestMemo>(memo: M, compute: CountingCompute) {
    let results = get_concurrently(&memo, vec!["fail-k".to_owned(); 50]).await;

    assert_eq!(compute.calls(), 1);
    let errors: Vec<_> = results
        .into_iter()
        .map(|r| match r {
            Err(MemoError::Compute(err)) => err,
            other => panic!("expected a compute error, got {other:?}"),
        })
        .collect();
    assert_eq!(*errors[0], FetchError("fail-k".to_owned()));
    assert!(errors.iter().all(|err| Arc::ptr_eq(err, &errors[0])));
}

async fn distinct_keys_run_in_parallel<M: TestMemo>(
    memo: M,
    compute: CountingCompute,
    delay: Duration,
) {
    let keys: Vec<String> = (0..8).map(|i| format!("key-{i}")).collect();

    let start = Instant::now();
    let results = get_concurrently(&memo, keys.clone()).await;
    let elapsed = start.elapsed();

    assert_eq!(compute.calls(), 8);
    for (key, result) in keys.iter().zip(results) {
        assert_eq!(result, Ok(format!("value of {key}")));
    }
    assert!(
        elapsed < delay * 2,
        "8 computations of {delay:?} took {elapsed:?}, they did not overlap"
    );
}

async fn refetch_hits_the_cache<M: TestMemo>(memo: M, compute: CountingCompute) {
    assert_eq!(memo.get("k".to_owned()).await, Ok("value of k".to_owned()));
    assert_eq!(memo.get("k".to_owned()).await, Ok("value of k".to_owned()));
    assert_eq!(
        memo.get("other".to_owned()).await,
        Ok("value of other".to_owned())
    );
    assert_eq!(memo.get("k".to_owned()).await, Ok("value of k".to_owned()));

    assert_eq!(compute.calls(), 2);
}

async fn errors_are_cached_for_good<M: TestMemo>(memo: M, compute: CountingCompute) {
    let first = memo.get("fail-once".to_owned()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let later = memo.get("fail-once".to_owned()).await;

    let expected = Err(MemoError::Compute(Arc::new(FetchError(
        "fail-once".to_owned(),
    ))));
    assert_eq!(first, expected);
    assert_eq!(later, expected);
    assert_eq!(compute.calls(), 1);
}

async fn repeated_keys_compute_once_each<M: TestMemo>(memo: M, compute: CountingCompute) {
    let keys = repeating_keys();
    let results = get_concurrently(&memo, keys.clone()).await;

    assert_eq!(compute.calls(), 5);
    for (key, result) in keys.iter().zip(results) {
        assert_eq!(result, Ok(format!("value of {key}")));
    }
}

async fn panics_are_cached_and_isolated<M: TestMemo>(memo: M, compute: CountingCompute) {
    let results = get_concurrently(
        &memo,
        vec!["panic-k".to_owned(), "panic-k".to_owned(), "fine".to_owned()],
    )
    .await;

    match &results[0] {
        Err(MemoError::Panicked(message)) => assert_eq!(&**message, "cannot compute panic-k"),
        other => panic!("expected a cached panic, got {other:?}"),
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[2], Ok("value of fine".to_owned()));

    // Neither retried nor poisoning anything else.
    assert_eq!(memo.get("panic-k".to_owned()).await, results[0]);
    assert_eq!(
        memo.get("after".to_owned()).await,
        Ok("value of after".to_owned())
    );
    assert_eq!(compute.calls(), 3);
}

macro_rules! memo_properties {
    ($strategy:ident, $new:expr) => {
        mod $strategy {
            use super::*;

            fn memo(compute: CountingCompute) -> impl TestMemo {
                ($new)(compute)
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn computes_once_under_contention() {
                let compute = CountingCompute::with_delay(Duration::from_millis(50));
                super::computes_once_under_contention(memo(compute.clone()), compute).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn concurrent_failures_share_one_error() {
                let compute = CountingCompute::with_delay(Duration::from_millis(50));
                super::concurrent_failures_share_one_error(memo(compute.clone()), compute).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn distinct_keys_run_in_parallel() {
                let delay = Duration::from_millis(200);
                let compute = CountingCompute::with_delay(delay);
                super::distinct_keys_run_in_parallel(memo(compute.clone()), compute, delay).await;
            }

            #[tokio::test]
            async fn refetch_hits_the_cache() {
                let compute = CountingCompute::new();
                super::refetch_hits_the_cache(memo(compute.clone()), compute).await;
            }

            #[tokio::test]
            async fn errors_are_cached_for_good() {
                let compute = CountingCompute::new();
                super::errors_are_cached_for_good(memo(compute.clone()), compute).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn repeated_keys_compute_once_each() {
                let compute = CountingCompute::with_delay(Duration::from_millis(20));
                super::repeated_keys_compute_once_each(memo(compute.clone()), compute).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn panics_are_cached_and_isolated() {
                let compute = CountingCompute::new();
                super::panics_are_cached_and_isolated(memo(compute.clone()), compute).await;
            }
        }
    };
}

memo_properties!(owner, |compute: CountingCompute| {
    Memo::<String, String, FetchError>::new(compute)
});
memo_properties!(lock, LockMemo::<String, CountingCompute>::new);
