//! HTTP middleware with retry support using reqwest-middleware.
//!
//! The client already retries failed attempts with a fixed delay. This demo
//! swaps its HTTP collaborator for a `reqwest-middleware` stack so transient
//! errors are additionally retried with exponential backoff underneath.
//!
//! Run with: `cargo run --example http_middleware_retry`

use langfuse_web::{CreateScore, LangfuseWeb, Result};
use reqwest_middleware::ClientBuilder as MiddlewareClientBuilder;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "langfuse_web=debug".into()),
        )
        .init();

    println!("=== HTTP Middleware with Retry Demo ===\n");

    // Retry transient errors up to 3 times with exponential delays
    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(100), Duration::from_secs(30))
        .build_with_max_retries(3);

    let http_client = MiddlewareClientBuilder::new(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build reqwest client"),
    )
    .with(RetryTransientMiddleware::new_with_policy(retry_policy))
    .build();

    // The outer loop only needs one extra attempt once the middleware gave up
    let client = LangfuseWeb::builder()
        .public_key(std::env::var("LANGFUSE_PUBLIC_KEY").unwrap_or_else(|_| "pk-lf-demo".into()))
        .retry_count(1)
        .retry_delay(Duration::from_secs(1))
        .build()?
        .with_fetcher(http_client);

    let score = CreateScore::builder()
        .trace_id("middleware-demo-trace")
        .name("middleware-example")
        .value(1)
        .comment("Sent through reqwest-middleware")
        .build();

    match client.score(score).await {
        Ok(()) => println!("\n✅ Score submitted"),
        Err(e) => eprintln!("\n❌ Error after retries: {e}"),
    }

    Ok(())
}
