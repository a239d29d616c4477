use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::mode::RunMode;

pub const DEFAULT_ASSISTANT_URL: &str = "http://localhost:3001";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:3000/api/opencode/apply";
pub const DEFAULT_SESSION_TITLE: &str = "PR Preview Change";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Editing is only possible in development mode
    pub mode: RunMode,
    /// Base URL of the OpenCode server
    pub assistant_url: String,
    /// Repository the assistant should edit; also sent as its working directory
    pub project_dir: Option<String>,
    /// Title given to every assistant session
    pub session_title: String,
    /// Address the endpoint server binds to
    pub listen: String,
    /// Endpoint the overlay posts change requests to
    pub endpoint_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            mode: RunMode::Production,
            assistant_url: DEFAULT_ASSISTANT_URL.to_string(),
            project_dir: None,
            session_title: DEFAULT_SESSION_TITLE.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
        }
    }

    /// Load the user config file and apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Environment variables win over the config file. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("OPENCODE_SERVER_URL") {
            self.assistant_url = url;
        }
        if let Some(dir) = lookup("PAGEGRAB_PROJECT_DIR") {
            self.project_dir = Some(dir);
        }
        if let Some(url) = lookup("PAGEGRAB_ENDPOINT_URL") {
            self.endpoint_url = url;
        }
        if let Some(raw) = lookup("PAGEGRAB_MODE") {
            match RunMode::from_str(&raw) {
                Some(mode) => self.mode = mode,
                None => tracing::warn!(value = %raw, "ignoring unknown PAGEGRAB_MODE"),
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("pagegrab").join("config.json"))
    }
}
