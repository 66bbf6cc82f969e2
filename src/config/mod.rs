mod init;
mod schema;

pub use init::{run_init_wizard, write_config};
pub use schema::{default_image_cache_dir, Config, ImagesConfig, ProviderKind, ServerConfig};

use crate::scoring::validate_scoring;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path (~/.config/oilboard/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("oilboard"))
}

/// Get the default config file path (~/.config/oilboard/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/oilboard/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing default config file is not an error; defaults are used instead.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "config loaded");
    Ok(config)
}

/// Validate a loaded configuration.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = match validate_scoring(&config.scoring) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if let Err(e) = config.images.refresh_after() {
        errors.push(format!(
            "images.refresh_after: invalid duration '{}' - {}",
            config.images.refresh_after, e
        ));
    }
    if let Err(e) = config.images.request_timeout() {
        errors.push(format!(
            "images.request_timeout: invalid duration '{}' - {}",
            config.images.request_timeout, e
        ));
    }
    if config.images.prefetch_concurrency == 0 {
        errors.push("images.prefetch_concurrency: must be at least 1".to_string());
    }
    if config.server.bind.trim().is_empty() {
        errors.push("server.bind: must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
