//! Logging configuration and subscriber setup

use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;
use crate::ports::{ClientConfig, LogFormat, LogLevel};

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Global log level, overridden by `RUST_LOG` when set
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include target module information
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            target: false,
        }
    }
}

impl From<&ClientConfig> for LoggingConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            level: config.log_level,
            format: config.log_format,
            target: config.log_level <= LogLevel::Debug,
        }
    }
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl LoggingSystem {
    /// Create a new logging system with configuration
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Filter from `RUST_LOG`, falling back to the configured level
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_directive()))
    }

    /// Install the global subscriber; logs go to stderr so stdout stays
    /// free for command output
    pub fn initialize(&self) -> Result<(), DomainError> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.config.target)
            .with_writer(std::io::stderr);

        let result = match self.config.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.map_err(|e| {
            DomainError::InternalError(format!("Failed to initialize logging: {}", e))
        })?;

        tracing::debug!(
            "Logging initialized with level {:?} and format {:?}",
            self.config.level,
            self.config.format
        );
        Ok(())
    }

    /// Log system information
    pub fn log_system_info(&self) {
        tracing::info!("=== BatchTrim ===");
        tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
        tracing::debug!("Logging level: {:?}", self.config.level);
        tracing::debug!("Output format: {:?}", self.config.format);
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}
