//! AWS Lambda entry point for content integrity checks
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! Invoke with `{"action": "resolve", "path": "/2015/05/08/slug/"}` or
//! `{"action": "check_batch", "caller": "cron", "max_posts": 10, "max_links_per_post": 50}`.

use content_integrity::lambda::handler;
use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Content integrity Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
