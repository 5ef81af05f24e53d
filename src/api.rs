// src/api.rs

//! HTTP routing for API Gateway proxy events.
//!
//! Accepts both payload versions:
//! - v1: `path`, `httpMethod`
//! - v2: `rawPath`, `requestContext.http.method`
//!
//! Only `GET /air-quality` is served. Routing does not depend on the Lambda
//! runtime, so it can be exercised directly.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{AirQualityResponse, Coordinates, ErrorResponse};
use crate::services::AirQualityService;

pub const AIR_QUALITY_PATH: &str = "/air-quality";

const SERIALIZATION_FAILED_BODY: &str =
    r#"{"statusCode":500,"error":"Internal Server Error","message":"internal error"}"#;

/// Suggested client back-off for retryable failures.
const RETRY_AFTER_SECS: u64 = 30;

const LATITUDE_PARAMS: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_PARAMS: [&str; 3] = ["longitude", "lng", "lon"];

/// Incoming proxy event. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpContext {
    pub method: String,
}

impl ApiRequest {
    /// Convenience constructor for a GET with query parameters.
    pub fn get(path: &str, query: &[(&str, &str)]) -> Self {
        Self {
            raw_path: Some(path.to_string()),
            http_method: Some("GET".to_string()),
            query_string_parameters: Some(
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Request method, upper-cased. Defaults to GET when absent.
    pub fn method(&self) -> String {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.http.as_ref())
            .map(|http| http.method.as_str())
            .or(self.http_method.as_deref())
            .unwrap_or("GET")
            .to_ascii_uppercase()
    }

    /// Request path without a trailing slash.
    pub fn path(&self) -> &str {
        let path = self
            .raw_path
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or("/");
        match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    /// First non-empty query value among `names`.
    pub fn query_param(&self, names: &[&str]) -> Option<&str> {
        let params = self.query_string_parameters.as_ref()?;
        names
            .iter()
            .filter_map(|name| params.get(*name))
            .map(|value| value.as_str())
            .find(|value| !value.trim().is_empty())
    }
}

/// Proxy response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        let (status, body) = match serde_json::to_string(body) {
            Ok(body) => (status, body),
            Err(e) => {
                log::error!("Failed to serialize response body: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SERIALIZATION_FAILED_BODY.to_string(),
                )
            }
        };

        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        Self {
            status_code: status.as_u16(),
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let body = ErrorResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error"),
            message,
        );
        Self::json(status, &body)
    }
}

/// HTTP status for a service error.
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Route one request.
pub async fn route(service: &AirQualityService, request: &ApiRequest) -> ApiResponse {
    let path = request.path();
    if path != AIR_QUALITY_PATH {
        return ApiResponse::error(StatusCode::NOT_FOUND, format!("Cannot route {path}"));
    }

    let method = request.method();
    if method != "GET" {
        let mut response = ApiResponse::error(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{method} is not supported on {path}"),
        );
        response.headers.insert("allow".to_string(), "GET".to_string());
        return response;
    }

    let coords = match parse_coordinates(request) {
        Ok(coords) => coords,
        Err(e) => return error_response(&e),
    };

    match service
        .get_air_quality(coords.latitude, coords.longitude)
        .await
    {
        Ok(result) => ApiResponse::json(StatusCode::OK, &AirQualityResponse::from(&result)),
        Err(e) => error_response(&e),
    }
}

fn parse_coordinates(request: &ApiRequest) -> Result<Coordinates, AppError> {
    let latitude = request
        .query_param(&LATITUDE_PARAMS)
        .ok_or_else(|| AppError::invalid_input("latitude is required"))?;
    let longitude = request
        .query_param(&LONGITUDE_PARAMS)
        .ok_or_else(|| AppError::invalid_input("longitude is required"))?;
    Coordinates::parse(latitude, longitude)
}

fn error_response(error: &AppError) -> ApiResponse {
    let status = status_for(error);
    if status.is_server_error() {
        log::warn!("Request failed with {}: {}", status, error);
    }
    let message = match error {
        AppError::InvalidInput(message) | AppError::UpstreamUnavailable(message) => message.clone(),
        _ => "internal error".to_string(),
    };
    let mut response = ApiResponse::error(status, message);
    if error.is_retryable() {
        response
            .headers
            .insert("retry-after".to_string(), RETRY_AFTER_SECS.to_string());
    }
    response
}
