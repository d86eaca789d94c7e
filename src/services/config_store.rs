// Configuration Storage Service
// Defaults, optional JSON config file and environment overrides

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use super::providers::{DEFAULT_INFERENCE_URL, DEFAULT_MAX_LENGTH, DEFAULT_MODEL};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paraphrase: ParaphraseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParaphraseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Load the model at startup instead of on the first request
    #[serde(default)]
    pub preload: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Try loading again on later calls after a failed load
    #[serde(default = "default_true")]
    pub retry_failed_load: bool,
}

impl Default for ParaphraseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preload: false,
            model: default_model(),
            api_url: default_api_url(),
            api_key: None,
            max_length: default_max_length(),
            timeout_secs: default_timeout_secs(),
            retry_failed_load: true,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_static_dir() -> PathBuf { PathBuf::from("frontend/build") }
fn default_true() -> bool { true }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_api_url() -> String { DEFAULT_INFERENCE_URL.to_string() }
fn default_max_length() -> u32 { DEFAULT_MAX_LENGTH }
fn default_timeout_secs() -> u64 { 30 }

/// Accepts 1/true/yes in any case
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> Option<bool> {
    env_var(name).map(|v| is_truthy(&v))
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "config.invalid_number_ignored");
            None
        }
    }
}

impl AppConfig {
    /// Overlay environment variables on top of the current values
    pub fn apply_env(&mut self) {
        if let Some(host) = env_var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_number("PORT") {
            self.server.port = port;
        }
        if let Some(dir) = env_var("STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        let p = &mut self.paraphrase;
        if let Some(preload) = env_flag("PRELOAD_MODEL") {
            p.preload = preload;
        }
        if let Some(disabled) = env_flag("PARAPHRASE_DISABLED") {
            p.enabled = !disabled;
        }
        if let Some(model) = env_var("PARAPHRASE_MODEL") {
            p.model = model;
        }
        if let Some(url) = env_var("PARAPHRASE_API_URL") {
            p.api_url = url;
        }
        if let Some(max_length) = env_number("PARAPHRASE_MAX_LENGTH") {
            p.max_length = max_length;
        }
        if let Some(secs) = env_number("PARAPHRASE_TIMEOUT_SECS") {
            p.timeout_secs = secs;
        }
        if let Some(retry) = env_flag("PARAPHRASE_RETRY_FAILED_LOAD") {
            p.retry_failed_load = retry;
        }
    }
}

pub struct ConfigStore {
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("humaniser"))
    }

    /// Load configuration from file, or defaults when there is none
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(|source| ConfigError::Read {
            path: self.config_file.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.config_file.clone(),
            source,
        })
    }
}

/// Resolve the effective configuration: defaults, then config file, then environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir).load()?,
        None => AppConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert!(config.paraphrase.enabled);
        assert!(!config.paraphrase.preload);
        assert_eq!(config.paraphrase.model, "Vamsi/T5_Paraphrase_Paws");
        assert_eq!(config.paraphrase.max_length, 256);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"paraphrase": {"model": "my/model", "preload": true}}"#,
        )
        .unwrap();

        let config = ConfigStore::new(dir.path().to_path_buf()).load().unwrap();
        assert_eq!(config.paraphrase.model, "my/model");
        assert!(config.paraphrase.preload);
        assert!(config.paraphrase.retry_failed_load);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigStore::new(dir.path().to_path_buf()).load().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_broken_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{not json").unwrap();
        let err = ConfigStore::new(dir.path().to_path_buf()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_is_truthy() {
        for v in ["1", "true", "TRUE", "Yes", " yes "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["0", "false", "no", "", "on"] {
            assert!(!is_truthy(v), "{v}");
        }
    }
}
