//! CLI configuration: where the managed service lives and where the cached
//! session is kept.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the managed data service
    pub server_url: String,
    /// Project API key (the anonymous role key)
    pub anon_key: String,
    /// Where the signed-in session is cached between invocations
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feira");
        Self {
            server_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            session_path: config_dir.join("session.yaml"),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(url) = std::env::var("FEIRA_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(key) = std::env::var("FEIRA_ANON_KEY") {
            config.anon_key = key;
        }
        if let Ok(session_path) = std::env::var("FEIRA_SESSION_PATH") {
            config.session_path = PathBuf::from(session_path);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/feira/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feira")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
