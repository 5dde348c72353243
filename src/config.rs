use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the backend endpoint
pub const ENDPOINT_ENV: &str = "CODECHAT_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Question-answering backend
    pub backend: BackendConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// Log output
    pub log: LogConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub chat_path: String,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            chat_path: "/chat".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Config::home_dir().map(|home| home.join("codechat.log")),
        }
    }
}

impl BackendConfig {
    /// Full URL of the chat operation
    pub fn chat_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = self.chat_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

impl Config {
    /// `~/.codechat`
    pub fn home_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".codechat"))
    }

    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let home = Self::home_dir().context("Could not find home directory")?;
        Ok(home.join("config.toml"))
    }

    /// Load configuration from `path` (or the default location) and apply the
    /// environment override. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = Self::load_file(&path)?;
        config.apply_endpoint_override(std::env::var(ENDPOINT_ENV).ok());
        Ok(config)
    }

    /// Read a config file without consulting the environment
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to `path`, creating its directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = self.to_toml()?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Replace the endpoint when an override is present and non-blank
    pub fn apply_endpoint_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                self.backend.endpoint = endpoint.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.backend.chat_url(), "http://localhost:8000/chat");
        assert!(config.ui.show_timestamps);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn chat_url_normalises_slashes() {
        let backend = BackendConfig {
            endpoint: "http://example.test:9000/".to_string(),
            chat_path: "chat".to_string(),
        };
        assert_eq!(backend.chat_url(), "http://example.test:9000/chat");

        let backend = BackendConfig {
            endpoint: "http://example.test/api".to_string(),
            chat_path: "/v1/chat".to_string(),
        };
        assert_eq!(backend.chat_url(), "http://example.test/api/v1/chat");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backend]\nendpoint = \"http://10.0.0.2:8000\"\n").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.backend.endpoint, "http://10.0.0.2:8000");
        assert_eq!(config.backend.chat_path, "/chat");
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ui.show_timestamps = false;
        config.log.level = "debug".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load_file(&path).unwrap(), config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backend\nendpoint = ").unwrap();
        assert!(Config::load_file(&path).is_err());
    }

    #[test]
    fn endpoint_override_ignores_blank_values() {
        let mut config = Config::default();
        config.apply_endpoint_override(Some("   ".to_string()));
        assert_eq!(config.backend.endpoint, "http://localhost:8000");

        config.apply_endpoint_override(None);
        assert_eq!(config.backend.endpoint, "http://localhost:8000");

        config.apply_endpoint_override(Some(" http://qa.internal:8080 ".to_string()));
        assert_eq!(config.backend.endpoint, "http://qa.internal:8080");
    }
}
