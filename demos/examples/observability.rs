//! Memo metrics exported in the Prometheus text format.
//!
//! ```sh
//! cargo run -p memo-examples --example observability --features observability
//! ```

use std::time::Duration;

use futures::future::join_all;
use memo::Memo;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus metrics recorder
fn init_metrics() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.000_001, 0.000_01, 0.000_1, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("memo_computation_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )
        .expect("Failed to set buckets")
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();
    let metrics = init_metrics();

    let memo = Memo::builder()
        .name("squares")
        .build(|n: u64| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n % 7 == 0 {
                Err(format!("{n} is unlucky"))
            } else {
                Ok(n * n)
            }
        });

    // Every key is asked for three times, but computed once.
    join_all((0..30u64).map(|i| memo.get(i % 10))).await;

    memo.shutdown();
    let _ = memo.get(1).await;
    memo.closed().await;

    println!("{}", metrics.render());
}
