//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.topowiz/config.json`) and environment.
//! Every field is optional; a missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Wizard backend settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Conversation defaults.
    #[serde(default)]
    pub wizard: WizardConfig,
}

/// Wizard backend location and request policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Base URL of the backend (default "http://localhost:8000"). Overridden by TOPOWIZ_API_URL env.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Unset (or 0) means requests wait indefinitely and a hung
    /// backend keeps the turn loading until restart.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

/// Conversation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardConfig {
    /// Text of the welcome turn synthesized when a new session comes back without messages.
    #[serde(default)]
    pub welcome_message: Option<String>,
}

/// Resolve the backend base URL: env TOPOWIZ_API_URL overrides config.
pub fn resolve_api_base_url(config: &Config) -> String {
    std::env::var("TOPOWIZ_API_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .unwrap_or_else(|| config.api.base_url.trim().to_string())
}

/// Request timeout from config; None when unset or zero.
pub fn request_timeout(config: &Config) -> Option<Duration> {
    config
        .api
        .request_timeout_secs
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

/// Welcome text override, if configured and non-empty.
pub fn resolve_welcome_message(config: &Config) -> Option<String> {
    config
        .wizard
        .welcome_message
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TOPOWIZ_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".topowiz").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or TOPOWIZ_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
