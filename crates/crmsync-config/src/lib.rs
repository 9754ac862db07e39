//! Shared configuration for crmsync hosts.
//!
//! Layered loading (defaults, TOML file, `CRMSYNC_` environment) and
//! translation into the transport and store settings the runtime crates
//! take. Nothing here reaches the network.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crmsync_api::TransportConfig;
use crmsync_core::StoreConfig;

const ENV_PREFIX: &str = "CRMSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config ──────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the backend API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Notification poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Only fetch unread notifications.
    #[serde(default)]
    pub unread_only: bool,

    /// Maximum notifications per fetch.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Bearer token for this session (prefer `CRMSYNC_TOKEN` over the file).
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            unread_only: false,
            limit: default_limit(),
            token: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_poll_interval_ms() -> u64 {
    30_000
}
fn default_limit() -> u32 {
    50
}

impl Config {
    /// Check the values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_url()?;
        if self.timeout_ms == 0 {
            return Err(validation("timeout_ms", "must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(validation("poll_interval_ms", "must be greater than zero"));
        }
        if self.limit == 0 {
            return Err(validation("limit", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_url).map_err(|e| validation("api_url", &e.to_string()))
    }

    pub fn token(&self) -> Option<SecretString> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_owned()))
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            ..TransportConfig::default()
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            unread_only: self.unread_only,
            limit: self.limit,
        }
    }
}

fn validation(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "crmsync", "crmsync").map_or_else(
        || PathBuf::from(".crmsync.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then the environment.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Extract and validate a `Config` from any figment.
pub fn extract(figment: &Figment) -> Result<Config, ConfigError> {
    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    extract(&figment_for(&config_path()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn from_toml(toml: &str) -> Result<Config, ConfigError> {
        extract(
            &Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::string(toml)),
        )
    }

    #[test]
    fn defaults_match_runtime_defaults() {
        let cfg = from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.store_config(), StoreConfig::default());
        assert_eq!(cfg.transport_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = from_toml(
            r#"
            api_url = "https://crm.example.com"
            poll_interval_ms = 5000
            unread_only = true
            limit = 20
            "#,
        )
        .unwrap();

        let store = cfg.store_config();
        assert_eq!(store.poll_interval, Duration::from_secs(5));
        assert!(store.unread_only);
        assert_eq!(store.limit, 20);
        assert_eq!(cfg.api_url().unwrap().host_str(), Some("crm.example.com"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = from_toml("poll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poll_interval_ms"));
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = from_toml(r#"api_url = "not a url""#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn empty_token_counts_as_none() {
        let cfg = from_toml(r#"token = """#).unwrap();
        assert!(cfg.token().is_none());

        let cfg = from_toml(r#"token = "abc""#).unwrap();
        assert!(cfg.token().is_some());
    }
}
