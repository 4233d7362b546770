// TOML config adapter - Configuration management using TOML files

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::error::BatchTrimError;
use crate::ports::*;

/// Table holding the client settings in a config file
const CONFIG_SECTION: &str = "batchtrim";

/// Prefix of environment variable overrides, e.g. `BATCHTRIM_SERVICE_URL`
pub const ENV_PREFIX: &str = "BATCHTRIM_";

/// Keys understood by the client
pub const CONFIG_KEYS: &[&str] = &[
    "service_url",
    "poll_interval_ms",
    "request_timeout_secs",
    "max_poll_failures",
    "log_level",
    "log_format",
];

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<HashMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter holding the defaults
    pub fn new() -> Result<Self, DomainError> {
        let adapter = Self {
            config: Arc::new(RwLock::new(Self::default_values())),
            config_file_path: Arc::new(RwLock::new(None)),
        };
        Ok(adapter)
    }

    fn default_values() -> HashMap<String, String> {
        let defaults = ClientConfig::default();
        let mut values = HashMap::new();
        values.insert("service_url".to_string(), defaults.service_url);
        values.insert(
            "poll_interval_ms".to_string(),
            defaults.poll_interval.as_millis().to_string(),
        );
        values.insert(
            "request_timeout_secs".to_string(),
            defaults.request_timeout.as_secs().to_string(),
        );
        values.insert(
            "max_poll_failures".to_string(),
            defaults.max_poll_failures.unwrap_or(0).to_string(),
        );
        values.insert("log_level".to_string(), "info".to_string());
        values.insert("log_format".to_string(), "pretty".to_string());
        values
    }

    /// Get default config file path
    pub fn get_default_config_path() -> PathBuf {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            PathBuf::from(appdata).join("BatchTrim").join("config.toml")
        } else if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config_home).join("batchtrim").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("batchtrim")
                .join("config.toml")
        } else {
            PathBuf::from("batchtrim.toml")
        }
    }

    /// Path of the file the settings were loaded from, if any
    pub fn loaded_from(&self) -> Option<PathBuf> {
        self.config_file_path
            .read()
            .ok()
            .and_then(|path| path.clone())
    }

    /// Apply `BATCHTRIM_<KEY>` overrides found through `lookup`
    pub fn apply_env_overrides<F>(&self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.write()?;
        let mut overrides = 0;
        for key in CONFIG_KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&var) {
                info!("Found environment override: {} = {}", var, value);
                config.insert(key.to_string(), value);
                overrides += 1;
            }
        }
        Ok(overrides)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .read()
            .map_err(|_| DomainError::InternalError("Config store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .write()
            .map_err(|_| DomainError::InternalError("Config store lock poisoned".to_string()))
    }

    /// Deserialize config from TOML string
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Value = toml::from_str(toml_content)
            .map_err(|e| DomainError::ConfigError(BatchTrimError::ConfigParse(e).to_string()))?;

        let mut config = self.write()?;
        if let Some(table) = parsed.get(CONFIG_SECTION).and_then(|s| s.as_table()) {
            for (key, value) in table {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    other => {
                        return Err(DomainError::ConfigError(format!(
                            "Unsupported value for {}: {}",
                            key, other
                        )))
                    }
                };
                debug!("Config file sets {} = {}", key, value);
                config.insert(key.clone(), value);
            }
        }

        Ok(())
    }

    fn parse_u64(config: &HashMap<String, String>, key: &str) -> Result<u64, DomainError> {
        let raw = config
            .get(key)
            .ok_or_else(|| DomainError::ConfigError(format!("Missing value for {}", key)))?;
        raw.trim().parse::<u64>().map_err(|e| {
            DomainError::ConfigError(format!("Invalid value for {}: '{}' ({})", key, raw, e))
        })
    }

    fn build_client_config(config: &HashMap<String, String>) -> Result<ClientConfig, DomainError> {
        let service_url = config
            .get("service_url")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| DomainError::ConfigError("service_url cannot be empty".to_string()))?;
        if !(service_url.starts_with("http://") || service_url.starts_with("https://")) {
            return Err(DomainError::ConfigError(
                BatchTrimError::InvalidUrl { url: service_url }.to_string(),
            ));
        }

        let poll_interval_ms = Self::parse_u64(config, "poll_interval_ms")?;
        if poll_interval_ms == 0 {
            return Err(DomainError::ConfigError(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        let request_timeout_secs = Self::parse_u64(config, "request_timeout_secs")?;
        if request_timeout_secs == 0 {
            return Err(DomainError::ConfigError(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        let max_poll_failures = u32::try_from(Self::parse_u64(config, "max_poll_failures")?)
            .map_err(|_| DomainError::ConfigError("max_poll_failures is too large".to_string()))?;

        let log_level = LogLevel::parse(config.get("log_level").map_or("info", String::as_str))?;
        let log_format =
            LogFormat::parse(config.get("log_format").map_or("pretty", String::as_str))?;

        Ok(ClientConfig {
            service_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_poll_failures: (max_poll_failures > 0).then_some(max_poll_failures),
            log_level,
            log_format,
        })
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        if !CONFIG_KEYS.contains(&key) {
            return Err(DomainError::ConfigError(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            )));
        }
        self.write()?.insert(key.to_string(), value.to_string());
        debug!("Set config {} = {}", key, value);
        Ok(())
    }

    async fn load_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DomainError::ConfigError(format!(
                "Failed to read config file {}: {}",
                file_path,
                BatchTrimError::IoError(e)
            ))
        })?;

        self.deserialize_config(&content)?;
        if let Ok(mut config_path) = self.config_file_path.write() {
            *config_path = Some(path);
        }
        info!("Loaded configuration from {}", file_path);

        Ok(())
    }

    async fn load_default_config(&self) -> Result<(), DomainError> {
        *self.write()? = Self::default_values();
        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read()?;

        if let Some(unknown) = config.keys().find(|key| !CONFIG_KEYS.contains(&key.as_str())) {
            return Err(DomainError::ConfigError(format!(
                "Unknown config key: {}",
                unknown
            )));
        }

        Self::build_client_config(&config).map(|_| ())
    }

    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError> {
        let mut keys: Vec<String> = self.read()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn client_config(&self) -> Result<ClientConfig, DomainError> {
        let config = self.read()?;
        Self::build_client_config(&config)
    }
}
