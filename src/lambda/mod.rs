// src/lambda/mod.rs

//! AWS Lambda handler for the air-quality API.
//!
//! One service (cache store + scraper) is built per execution environment
//! and shared by every invocation. A sweeper task runs alongside it while
//! the environment is warm.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use tracing::{info, instrument, warn};

use crate::api::{self, ApiRequest, ApiResponse};
use crate::error::Result;
use crate::models::Config;
use crate::pipeline::spawn_sweeper;
use crate::services::AirQualityService;

/// Handle one proxy event.
#[instrument(skip_all, fields(request_id = %event.context.request_id))]
pub async fn handler(
    service: &AirQualityService,
    event: LambdaEvent<ApiRequest>,
) -> std::result::Result<ApiResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!(
        "{} {} query={:?}",
        request.method(),
        request.path(),
        request.query_string_parameters
    );

    let response = api::route(service, &request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    if response.status_code >= 500 {
        warn!("Responded {} in {}ms", response.status_code, elapsed_ms);
    } else {
        info!("Responded {} in {}ms", response.status_code, elapsed_ms);
    }
    Ok(response)
}

/// Configuration for the Lambda environment: defaults overridden by env vars.
pub fn load_lambda_config() -> Result<Config> {
    let mut config = Config::default();
    config.apply_env();
    config.validate()?;
    Ok(config)
}

/// Build the service and serve invocations until the runtime stops.
pub async fn run() -> std::result::Result<(), LambdaError> {
    let config = load_lambda_config()?;
    let service = Arc::new(AirQualityService::from_config(&config).await?);
    let _sweeper = spawn_sweeper(service.store(), config.cache.sweep_interval());

    info!(
        "Air-quality Lambda ready (cache ttl {}s, sweep every {}s)",
        config.cache.ttl_secs, config.cache.sweep_interval_secs
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiRequest>| {
        let service = Arc::clone(&service);
        async move { handler(&service, event).await }
    }))
    .await
}
