//! Application configuration
//!
//! Loaded from a TOML file (by default `<data_local_dir>/aralin/config.toml`).
//! A missing file yields the defaults. A few environment variables override
//! what the file says so that secrets need not be written to disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "aralin";

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_DATABASE: &str = "ARALIN_DATABASE";
pub const ENV_BIND: &str = "ARALIN_BIND";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind: String,
    /// SQLite database file
    pub database: PathBuf,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            database: data_dir().join("aralin.db"),
            generation: GenerationConfig::default(),
        }
    }
}

/// Settings for the hosted text generation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: None,
            timeout_secs: 120,
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

impl AppConfig {
    /// Load the config at `path` (or the default path), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        let mut config = Self::load_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file without looking at the environment.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)?;
        let config = toml::from_str(&data)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = PathBuf::from(database);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = bind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_file(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.generation.model, "gemini-pro");
        assert_eq!(config.generation.timeout_secs, 120);
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
bind = "0.0.0.0:9000"

[generation]
model = "gemini-1.5-flash"
temperature = 0.4
"#,
        )
        .unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.generation.model, "gemini-1.5-flash");
        assert_eq!(config.generation.temperature, Some(0.4));
        assert_eq!(
            config.generation.base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert!(config.generation.api_key.is_none());
    }

    #[test]
    fn test_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "bind = [").unwrap();
        assert!(matches!(AppConfig::load_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.database = temp.path().join("data.db");
        config.generation.api_key = Some("k".to_string());
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_KEY, "secret"),
            (ENV_DATABASE, "/tmp/other.db"),
            (ENV_BIND, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.generation.api_key.as_deref(), Some("secret"));
        assert_eq!(config.database, PathBuf::from("/tmp/other.db"));
        // Blank values are ignored
        assert_eq!(config.bind, "127.0.0.1:8080");
    }
}
