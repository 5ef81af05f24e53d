//! AWS Lambda entry point for the air-quality API
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! and put the function behind API Gateway or a function URL.

use airquality::lambda;
use lambda_runtime::Error as LambdaError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Air-quality Lambda starting...");
    lambda::run().await
}
