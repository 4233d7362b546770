// Adapters - External system implementations

pub mod http_service;
pub mod toml_config;

// Re-export adapters
pub use http_service::HttpServiceAdapter;
pub use toml_config::TomlConfigAdapter;
