//! Sequential and concurrent lookups through both memo strategies.
//!
//! The computation sleeps for 200ms per key. Sequential lookups of eight keys
//! with three repeats take five computations' worth of time; concurrent ones
//! take about one, whichever strategy guards the table.

use std::convert::Infallible;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use futures::future::join_all;
use memo::{LockMemo, Memo, Memoize};

const KEYS: &[&str] = &["a", "b", "c", "d", "a", "b", "c", "e"];
const DELAY: Duration = Duration::from_millis(200);

async fn slow_len(key: String) -> Result<usize, Infallible> {
    tokio::time::sleep(DELAY).await;
    Ok(key.len())
}

async fn sequential<M>(label: &str, memo: &M)
where
    M: Memoize<String>,
    M::Value: Debug,
    M::Error: Debug,
{
    let start = Instant::now();
    for key in KEYS {
        let result = memo.get(key.to_string()).await;
        println!("  {key} -> {result:?}");
    }
    println!("{label} sequential: {:?}", start.elapsed());
}

async fn concurrent<M>(label: &str, memo: &M)
where
    M: Memoize<String>,
{
    let start = Instant::now();
    join_all(KEYS.iter().map(|key| memo.get(key.to_string()))).await;
    println!("{label} concurrent: {:?}", start.elapsed());
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    sequential("Memo", &Memo::new(slow_len)).await;
    concurrent("Memo", &Memo::new(slow_len)).await;

    sequential("LockMemo", &LockMemo::<String, _>::new(slow_len)).await;
    concurrent("LockMemo", &LockMemo::<String, _>::new(slow_len)).await;
}
