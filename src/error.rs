// src/error.rs

//! Unified error handling for the air-quality service.

use std::fmt;

use thiserror::Error;

/// Result type alias for air-quality operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Coordinates missing, unparseable or out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The data source could not produce a reading
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The cache backing store could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an upstream failure error.
    pub fn upstream(message: impl fmt::Display) -> Self {
        Self::UpstreamUnavailable(message.to_string())
    }

    /// Create a storage failure error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::StorageUnavailable(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a client may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_) | Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_is_retryable() {
        assert!(AppError::upstream("timeout").is_retryable());
        assert!(!AppError::invalid_input("latitude").is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::selector(".air_info", "unexpected token");
        assert_eq!(
            err.to_string(),
            "Invalid selector '.air_info': unexpected token"
        );
    }
}
