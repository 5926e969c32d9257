//! Configuration loading, validation, and management for ecargraph.
//!
//! Loads configuration from `~/.ecargraph/config.toml` with environment
//! variable overrides. Validates all settings at startup so a bad setting
//! never surfaces halfway through a conversion.

use ecargraph_core::FilterSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ecargraph/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dgraph Alpha gRPC address, handed to the bulk loader
    #[serde(default = "default_alpha")]
    pub alpha: String,

    /// Dgraph Zero address, handed to the bulk loader
    #[serde(default = "default_zero")]
    pub zero: String,

    /// Dgraph Alpha HTTP endpoint used for schema alteration
    #[serde(default = "default_alpha_http")]
    pub alpha_http: String,

    /// Timeout for schema requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Default `predicate:search:value` filter applied when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Bulk loader settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Directory watch settings
    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_alpha() -> String {
    "localhost:9080".into()
}
fn default_zero() -> String {
    "localhost:6080".into()
}
fn default_alpha_http() -> String {
    "http://localhost:8080".into()
}
fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Loader executable (looked up on `PATH` unless absolute)
    #[serde(default = "default_loader_binary")]
    pub binary: String,

    /// Identity-map directory shared across loads so blank nodes coalesce
    #[serde(default = "default_xidmap")]
    pub xidmap: String,

    /// Input format flag passed to the loader
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_loader_binary() -> String {
    "dgraph".into()
}
fn default_xidmap() -> String {
    "xid_uid".into()
}
fn default_format() -> String {
    "rdf".into()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            binary: default_loader_binary(),
            xidmap: default_xidmap(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to watch; the current directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Apply the schema before watching
    #[serde(default)]
    pub setup: bool,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ecargraph/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ECARGRAPH_ALPHA`
    /// - `ECARGRAPH_ZERO`
    /// - `ECARGRAPH_ALPHA_HTTP`
    /// - `ECARGRAPH_FILTER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(alpha) = var("ECARGRAPH_ALPHA") {
            self.alpha = alpha;
        }
        if let Some(zero) = var("ECARGRAPH_ZERO") {
            self.zero = zero;
        }
        if let Some(endpoint) = var("ECARGRAPH_ALPHA_HTTP") {
            self.alpha_http = endpoint;
        }
        if let Some(filter) = var("ECARGRAPH_FILTER") {
            self.filter = Some(filter);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ecargraph")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("alpha", &self.alpha), ("zero", &self.zero)] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} address must not be empty"
                )));
            }
        }

        if !(self.alpha_http.starts_with("http://") || self.alpha_http.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "alpha_http must be an http(s) URL, got '{}'",
                self.alpha_http
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if !matches!(self.loader.format.as_str(), "rdf" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "loader.format must be 'rdf' or 'json', got '{}'",
                self.loader.format
            )));
        }

        if self.loader.binary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "loader.binary must not be empty".into(),
            ));
        }

        if let Some(expr) = &self.filter {
            FilterSpec::compile(expr)
                .map_err(|e| ConfigError::ValidationError(format!("filter: {e}")))?;
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            zero: default_zero(),
            alpha_http: default_alpha_http(),
            request_timeout_secs: default_request_timeout(),
            filter: None,
            loader: LoaderConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
