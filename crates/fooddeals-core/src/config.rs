//! Configuration management for the FoodDeals client.
//!
//! Loads configuration from ${FOODDEALS_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the API base URL.
pub const BASE_URL_ENV: &str = "FOODDEALS_API_BASE_URL";

/// API used when neither env nor config provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for FoodDeals configuration and data directories.
    //!
    //! FOODDEALS_HOME resolution order:
    //! 1. FOODDEALS_HOME environment variable (if set)
    //! 2. ~/.config/fooddeals (default)

    use std::path::PathBuf;

    /// Returns the FoodDeals home directory.
    ///
    /// Checks FOODDEALS_HOME env var first, falls back to ~/.config/fooddeals,
    /// and to a relative `.fooddeals` when no home directory is known.
    pub fn fooddeals_home() -> PathBuf {
        if let Ok(home) = std::env::var("FOODDEALS_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".fooddeals"),
            |h| h.join(".config").join("fooddeals"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        fooddeals_home().join("config.toml")
    }

    /// Returns the path to the persisted access token.
    pub fn session_path() -> PathBuf {
        fooddeals_home().join("session.json")
    }

    /// Returns the path to the persisted cookie jar.
    pub fn cookies_path() -> PathBuf {
        fooddeals_home().join("cookies.json")
    }

    /// Returns the log directory.
    pub fn logs_dir() -> PathBuf {
        fooddeals_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API; env var takes precedence
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds (0 = no timeout)
    pub request_timeout_secs: u64,
    /// Path where uploaded files are served from
    pub static_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            static_path: Self::DEFAULT_STATIC_PATH.to_string(),
        }
    }
}

impl Config {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_STATIC_PATH: &str = "/static";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// Trailing slashes are removed so paths can be appended directly.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not well-formed.
    pub fn api_base_url(&self) -> Result<String> {
        let env_value = std::env::var(BASE_URL_ENV).ok();
        resolve_base_url(env_value.as_deref(), self.api_base_url.as_deref())
    }

    /// Request timeout, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Public URL of an uploaded file.
    pub fn static_file_url(&self, base_url: &str, filename: &str) -> String {
        let prefix = self.static_path.trim_matches('/');
        if prefix.is_empty() {
            format!("{base_url}/{filename}")
        } else {
            format!("{base_url}/{prefix}/{filename}")
        }
    }
}

fn resolve_base_url(env_value: Option<&str>, config_value: Option<&str>) -> Result<String> {
    let chosen = [env_value, config_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.static_path, "/static");
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::init(&path).unwrap();
        assert!(path.exists());
        let err = Config::init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("http://env:9000/"), Some("http://cfg:8000")).unwrap(),
            "http://env:9000"
        );
        assert_eq!(
            resolve_base_url(Some("  "), Some("http://cfg:8000")).unwrap(),
            "http://cfg:8000"
        );
        assert_eq!(resolve_base_url(None, None).unwrap(), DEFAULT_BASE_URL);
        assert!(resolve_base_url(None, Some("not a url")).is_err());
    }

    #[test]
    fn test_static_file_url() {
        let config = Config::default();
        assert_eq!(
            config.static_file_url("http://localhost:8000", "taco.jpg"),
            "http://localhost:8000/static/taco.jpg"
        );
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.request_timeout().is_none());
    }
}
