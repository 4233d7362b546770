//! Configuration initialization and hierarchy management

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::adapters::TomlConfigAdapter;
use crate::cli::Cli;
use crate::ports::{ClientConfig, ConfigPort};

/// Build the client settings following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(cli: &Cli) -> Result<ClientConfig> {
    initialize_with_env(cli, |var| std::env::var(var).ok()).await
}

/// Same as [`initialize_configuration_hierarchy`] with an injectable environment
pub async fn initialize_with_env<F>(cli: &Cli, env: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // Defaults are loaded by TomlConfigAdapter::new()
    let adapter = TomlConfigAdapter::new()?;

    load_config_file(&adapter, cli.config.as_deref()).await?;

    let env_overrides = adapter.apply_env_overrides(env)?;
    if env_overrides > 0 {
        debug!("Applied {} environment variable overrides", env_overrides);
    }

    apply_cli_configuration_overrides(&adapter, cli).await?;

    adapter
        .validate_config()
        .await
        .context("Invalid client configuration")?;
    Ok(adapter.client_config().await?)
}

/// Load an explicit config file, or the default one when it exists
async fn load_config_file(adapter: &TomlConfigAdapter, explicit: Option<&str>) -> Result<()> {
    if let Some(path) = explicit {
        adapter
            .load_config(path)
            .await
            .with_context(|| format!("Failed to load config file {}", path))?;
        return Ok(());
    }

    let default_path = TomlConfigAdapter::get_default_config_path();
    if Path::new(&default_path).exists() {
        adapter
            .load_config(&default_path.to_string_lossy())
            .await
            .with_context(|| format!("Failed to load config file {}", default_path.display()))?;
    } else {
        debug!("No config file at {}", default_path.display());
    }
    Ok(())
}

/// Apply global flag overrides
async fn apply_cli_configuration_overrides(adapter: &TomlConfigAdapter, cli: &Cli) -> Result<()> {
    let overrides = [
        ("service_url", cli.service_url.as_deref()),
        ("log_level", cli.log_level.as_deref()),
        ("log_format", cli.log_format.as_deref()),
    ];

    let mut applied = 0;
    for (key, value) in overrides {
        if let Some(value) = value {
            adapter.set_config(key, value).await?;
            applied += 1;
        }
    }

    if applied > 0 {
        debug!("Applied {} CLI configuration overrides", applied);
    }
    Ok(())
}
