//! Configuration loading and persistence.
//!
//! The server key and save endpoint are injected into the agent as an
//! [`AgentConfig`] built once at startup. It is read from `config.json` in
//! the config directory, falls back to built-in defaults, and accepts
//! environment variable overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use crate::error::SubscriptionError;
use crate::key::ApplicationServerKey;
use crate::retry::RetryPolicy;

/// Public key the access point backend signs its pushes with.
pub const DEFAULT_SERVER_PUBLIC_KEY: &str =
    "BCl1nRIpzter17Vhu8_O73GUJ-9zGm5oUxlO8twXnh55atinGUX6quUm-8Hrq__szDuawfG7WGHcU38J-he-QOs";

/// Backend endpoint that stores push subscriptions.
pub const DEFAULT_SAVE_ENDPOINT: &str = "https://quacc.us:443/save-subscription";

/// Configuration for the push agent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Application server public key (base64url, unpadded).
    pub server_public_key: String,
    /// URL the subscription descriptor is POSTed to.
    pub save_endpoint: String,
    /// Title of every push notification.
    pub notification_title: String,
    /// Agent script registered with the host container.
    pub script_url: String,
    /// Upper bound in seconds for one save request.
    pub transmit_timeout_secs: u64,
    /// Retry policy around the save request.
    pub retry: RetryPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_public_key: DEFAULT_SERVER_PUBLIC_KEY.to_string(),
            save_endpoint: DEFAULT_SAVE_ENDPOINT.to_string(),
            notification_title: "Got it".to_string(),
            script_url: "service.js".to_string(),
            transmit_timeout_secs: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl AgentConfig {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `AP_PUSH_CONFIG_DIR` overrides the platform config dir
    /// (Linux: `~/.config/ap-push-agent`).
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("AP_PUSH_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ap-push-agent")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Path of the config file inside [`Self::config_dir`].
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from `path` without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `AP_PUSH_*` overrides resolved through `lookup`.
    ///
    /// Numeric values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("AP_PUSH_SERVER_KEY") {
            self.server_public_key = key;
        }

        if let Some(endpoint) = lookup("AP_PUSH_SAVE_ENDPOINT") {
            self.save_endpoint = endpoint;
        }

        if let Some(title) = lookup("AP_PUSH_NOTIFICATION_TITLE") {
            self.notification_title = title;
        }

        if let Some(timeout) = lookup("AP_PUSH_TRANSMIT_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.transmit_timeout_secs = secs;
            }
        }

        if let Some(attempts) = lookup("AP_PUSH_MAX_ATTEMPTS") {
            if let Ok(max) = attempts.parse::<u32>() {
                self.retry.max_attempts = max;
            }
        }
    }

    /// Persists the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Decoded and validated application server key.
    pub fn server_key(&self) -> Result<ApplicationServerKey, SubscriptionError> {
        ApplicationServerKey::from_base64url(&self.server_public_key)
    }

    /// Parsed save endpoint.
    pub fn save_url(&self) -> Result<reqwest::Url> {
        let url = reqwest::Url::parse(&self.save_endpoint)
            .with_context(|| format!("Invalid save endpoint {:?}", self.save_endpoint))?;
        anyhow::ensure!(
            matches!(url.scheme(), "https" | "http"),
            "Save endpoint must be an http(s) URL, got {}",
            url.scheme()
        );
        Ok(url)
    }

    /// Timeout applied to each save request.
    pub fn transmit_timeout(&self) -> Duration {
        Duration::from_secs(self.transmit_timeout_secs)
    }

    /// Check every field that can be wrong before the agent starts.
    pub fn validate(&self) -> Result<()> {
        self.server_key().context("Invalid server public key")?;
        self.save_url()?;
        anyhow::ensure!(self.transmit_timeout_secs > 0, "transmit_timeout_secs must be positive");
        anyhow::ensure!(self.retry.max_attempts > 0, "retry.max_attempts must be at least 1");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.save_endpoint, "https://quacc.us:443/save-subscription");
        assert_eq!(config.notification_title, "Got it");
        assert_eq!(config.script_url, "service.js");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"save_endpoint": "https://backend.test/save-subscription"}"#).unwrap();

        let config = AgentConfig::load_from(&path).unwrap();
        assert_eq!(config.save_endpoint, "https://backend.test/save-subscription");
        assert_eq!(config.server_public_key, DEFAULT_SERVER_PUBLIC_KEY);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AgentConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AgentConfig::default();
        config.notification_title = "Access point update".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(AgentConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AP_PUSH_SAVE_ENDPOINT", "http://localhost:8000/save-subscription"),
            ("AP_PUSH_TRANSMIT_TIMEOUT", "3"),
            ("AP_PUSH_MAX_ATTEMPTS", "not-a-number"),
        ]);

        let mut config = AgentConfig::default();
        config.apply_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.save_endpoint, "http://localhost:8000/save-subscription");
        assert_eq!(config.transmit_timeout(), Duration::from_secs(3));
        assert_eq!(config.retry.max_attempts, RetryPolicy::default().max_attempts);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = AgentConfig::default();
        config.save_endpoint = "ftp://quacc.us/save".to_string();
        assert!(config.validate().is_err());

        config.save_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_key() {
        let mut config = AgentConfig::default();
        config.server_public_key = "AAAA".to_string();
        assert!(config.validate().is_err());
    }
}
