//! Error handling module for BatchTrim adapters

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Transport and configuration failures raised inside adapters
#[derive(Error, Debug)]
pub enum BatchTrimError {
    /// Service URL could not be used to build a request
    #[error("Invalid service URL: {url}")]
    InvalidUrl { url: String },

    /// Service answered with a non-success status
    #[error("Service responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// Transport error (connection refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BatchTrimError {
    /// Convert into the domain error matching the failed operation
    pub fn into_domain(self, wrap: fn(String) -> DomainError) -> DomainError {
        wrap(self.to_string())
    }
}

/// Result type alias for adapter operations
pub type BatchTrimResult<T> = std::result::Result<T, BatchTrimError>;
