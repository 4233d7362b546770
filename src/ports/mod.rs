// Ports - Interface definitions (contracts)

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for the remote processing service
///
/// Paths handed to this port are already normalized; the port sends them
/// as given.
#[async_trait]
pub trait TrimServicePort: Send + Sync {
    /// Inspect the representative file of a folder (`GET /api/scan`)
    async fn scan(&self, folder_path: &str) -> Result<ScanResult, DomainError>;

    /// Start a trim job (`POST /api/process`)
    async fn submit(&self, request: &ProcessRequest) -> Result<SubmissionAck, DomainError>;

    /// Read the status of the current job (`GET /api/status`)
    async fn status(&self) -> Result<ProgressSnapshot, DomainError>;
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Load default configuration
    async fn load_default_config(&self) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;

    /// Get all configuration keys
    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError>;

    /// Typed view of the current settings
    async fn client_config(&self) -> Result<ClientConfig, DomainError>;
}

/// Settings of the service client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub service_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Consecutive failed status queries before polling gives up
    pub max_poll_failures: Option<u32>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8080".to_string(),
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            max_poll_failures: Some(5),
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::ConfigError(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    /// Directive understood by `EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Single-line text format
    Compact,
    /// JSON lines for structured logging
    Json,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(format_str: &str) -> Result<Self, DomainError> {
        match format_str.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(DomainError::ConfigError(format!(
                "Invalid log format: {}. Valid formats: pretty, compact, json",
                format_str
            ))),
        }
    }
}
