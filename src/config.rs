//! Configuration loading and validation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Media file served at `/`
    #[serde(default = "default_media_path")]
    pub media_path: PathBuf,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Bytes requested per range fetch
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Timeout for a single range fetch
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_media_path() -> PathBuf {
    PathBuf::from("video.mp4")
}
fn default_content_type() -> String {
    "video/mp4".to_string()
}
fn default_chunk_size() -> u64 {
    5 * 1024 * 1024
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            media_path: default_media_path(),
            content_type: default_content_type(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./rangecast.toml",
        "~/.config/rangecast/config.toml",
        "/etc/rangecast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.client.chunk_size == 0 {
        anyhow::bail!("Client chunk size cannot be 0");
    }

    // The media file only has to exist once `serve` starts, so warn here.
    if !config.server.media_path.exists() {
        tracing::warn!("Media path does not exist: {:?}", config.server.media_path);
    }

    Ok(())
}
