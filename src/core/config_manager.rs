// src/core/config_manager.rs
//! Client configuration: an optional `portal.yaml` with `local` and
//! `production` sections, then environment overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_CONFIG_FILE: &str = "portal.yaml";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: String,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            session_path: PathBuf::from(".portal/session.json"),
            timeout_seconds: 30,
            poll_interval_seconds: 30,
            log_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<ClientConfig>,
    #[serde(default)]
    production: Option<ClientConfig>,
}

impl ConfigManager {
    /// Load configuration from `portal.yaml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading client configuration for environment: {}", environment);

        let mut client = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::select(&content, &environment)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            ClientConfig::default()
        };

        if let Ok(url) = std::env::var("PORTAL_API_URL") {
            client.api_base_url = url;
        }
        if let Ok(path) = std::env::var("PORTAL_SESSION_PATH") {
            client.session_path = PathBuf::from(path);
        }
        client.session_path = Self::resolve_path(&client.session_path)?;

        Ok(Self {
            environment,
            client,
        })
    }

    fn get_environment() -> String {
        std::env::var("PORTAL_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn select(content: &str, environment: &str) -> Result<ClientConfig> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        let section = match environment {
            "production" => file.production,
            _ => file.local,
        };
        Ok(section.unwrap_or_default())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the session file's directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        use crate::core::FsOps;

        if let Some(parent) = self.client.session_path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
local:
  api_base_url: "http://localhost:8000/api/v1"
  poll_interval_seconds: 10
production:
  api_base_url: "https://portal.example.com/api/v1"
  session_path: "/var/lib/portal/session.json"
"#;

    #[test]
    fn test_select_section_with_defaults() {
        let local = ConfigManager::select(SAMPLE, "local").unwrap();
        assert_eq!(local.api_base_url, "http://localhost:8000/api/v1");
        assert_eq!(local.poll_interval_seconds, 10);
        assert_eq!(local.timeout_seconds, 30);

        let prod = ConfigManager::select(SAMPLE, "production").unwrap();
        assert_eq!(prod.session_path, PathBuf::from("/var/lib/portal/session.json"));
        assert_eq!(prod.poll_interval_seconds, 30);
    }

    #[test]
    fn test_missing_section_falls_back_to_defaults() {
        let config = ConfigManager::select("local:\n  timeout_seconds: 5\n", "production").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(ConfigManager::select("local: [unclosed", "local").is_err());
    }
}
