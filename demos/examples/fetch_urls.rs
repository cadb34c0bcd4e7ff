//! Memoized HTTP fetches.
//!
//! Eight URLs, three of them repeated, are fetched concurrently. Each
//! distinct URL is downloaded once; repeated URLs wait for the first download
//! and report the same body.
//!
//! ```sh
//! RUST_LOG=memo=debug cargo run -p memo-examples --example fetch_urls
//! ```

use std::time::Instant;

use bytes::Bytes;
use futures::future::join_all;
use memo::Memo;
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const URLS: &[&str] = &[
    "https://go.dev",
    "https://pkg.go.dev",
    "https://go.dev/play",
    "https://www.rust-lang.org",
    "https://go.dev",
    "https://pkg.go.dev",
    "https://go.dev/play",
    "https://crates.io",
];

async fn http_get_body(client: Client, url: String) -> Result<Bytes, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.bytes().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,memo=debug")),
        )
        .init();

    let client = Client::builder().user_agent("memo-example/1.0").build()?;
    let memo = Memo::builder()
        .name("http")
        .build(move |url: String| http_get_body(client.clone(), url));

    let fetches = URLS.iter().map(|url| {
        let memo = memo.clone();
        async move {
            let start = Instant::now();
            match memo.get(url.to_string()).await {
                Ok(body) => info!(
                    url,
                    elapsed = ?start.elapsed(),
                    bytes = body.len(),
                    "fetched"
                ),
                Err(err) => warn!(url, elapsed = ?start.elapsed(), %err, "fetch failed"),
            }
        }
    });
    join_all(fetches).await;

    memo.shutdown();
    memo.closed().await;
    Ok(())
}
