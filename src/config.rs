use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

const CONFIG_PATH_ENV: &str = "ZIMER_CHAT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Startup configuration, read from `config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the chat service.
    pub backend_url: String,
    /// Issue a silent greeting request the first time the panel opens.
    pub auto_greet: bool,
    /// Per-request timeout. Absent means requests wait indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            auto_greet: false,
            request_timeout_secs: None,
        }
    }
}

impl ChatConfig {
    /// Loads from the path in `ZIMER_CHAT_CONFIG`, falling back to
    /// `./config.yml`. A missing file yields the defaults; an existing
    /// but malformed file is an error.
    pub fn load() -> color_eyre::Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> color_eyre::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
