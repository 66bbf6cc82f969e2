use crate::scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration. Every section is optional in the YAML file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Catalog JSON consumed by the dashboard
    pub data_file: PathBuf,
    pub server: ServerConfig,
    pub images: ImagesConfig,
    pub scoring: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/oils_full.json"),
            server: ServerConfig::default(),
            images: ImagesConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Open the dashboard in a browser once the server is listening
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            open_browser: false,
        }
    }
}

/// Image search providers, tried in the configured order
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Unsplash,
    Bing,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Defaults to the platform cache dir (`~/.cache/oilboard/images` on Linux)
    pub cache_dir: Option<PathBuf>,
    /// Cached entries older than this are served, then refreshed in the background
    pub refresh_after: String,
    pub request_timeout: String,
    pub providers: Vec<ProviderKind>,
    /// Falls back to OILBOARD_GOOGLE_API_KEY
    pub google_api_key: Option<String>,
    /// Falls back to OILBOARD_GOOGLE_CSE_ID
    pub google_cse_id: Option<String>,
    /// Falls back to OILBOARD_UNSPLASH_ACCESS_KEY
    pub unsplash_access_key: Option<String>,
    /// Image URL returned when no provider finds anything
    pub fallback_url: String,
    pub prefetch_concurrency: usize,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            refresh_after: "7d".to_string(),
            request_timeout: "10s".to_string(),
            providers: vec![ProviderKind::Google, ProviderKind::Unsplash, ProviderKind::Bing],
            google_api_key: None,
            google_cse_id: None,
            unsplash_access_key: None,
            fallback_url: "/images/placeholder.svg".to_string(),
            prefetch_concurrency: 4,
        }
    }
}

impl ImagesConfig {
    pub fn refresh_after(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.refresh_after)
    }

    pub fn request_timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.request_timeout)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_image_cache_dir)
    }
}

/// Platform cache directory for downloaded images
pub fn default_image_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("oilboard/images"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/oilboard/images",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}
