// ABOUTME: Configuration file handling for the wayfarer TUI
// ABOUTME: TOML config with env var and CLI override support

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Session to resume on startup. A fresh id is generated when unset.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            session_id: None,
        }
    }
}

fn default_server_url() -> String {
    "ws://127.0.0.1:8000".to_string()
}

impl Config {
    /// Load config with precedence: CLI > env > file > defaults
    pub fn load(server_override: Option<&str>, session_override: Option<&str>) -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("WAYFARER_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(session) = std::env::var("WAYFARER_SESSION") {
            config.session_id = Some(session);
        }

        if let Some(url) = server_override {
            config.server_url = url.to_string();
        }
        if let Some(session) = session_override {
            config.session_id = Some(session.to_string());
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("wayfarer").join("config.toml"))
    }

    /// Directory for persisted TUI state (input history, last session).
    pub fn state_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("wayfarer").join("tui"))
    }
}
