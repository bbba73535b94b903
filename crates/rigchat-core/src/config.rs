use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::mode::Mode;
use crate::stream::FrameRecovery;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:54321/functions/v1/ai-chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub default_mode: Option<String>,
    /// Unset keeps requeueing an unparseable frame until the stream ends.
    pub max_frame_retries: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", config_path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
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

    pub fn save_default_mode(mode: Mode) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_mode = Some(mode.as_str().to_string());
        config.save()
    }

    /// Endpoint to post to - env var first, then config, then the local default.
    pub fn endpoint(&self) -> String {
        std::env::var("RIGCHAT_ENDPOINT")
            .ok()
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var("RIGCHAT_API_KEY")
            .ok()
            .or_else(|| self.api_key.clone())
    }

    pub fn mode(&self) -> Mode {
        self.default_mode
            .as_deref()
            .and_then(Mode::from_str)
            .unwrap_or_default()
    }

    pub fn frame_recovery(&self) -> FrameRecovery {
        match self.max_frame_retries {
            Some(retries) => FrameRecovery::Bounded(retries),
            None => FrameRecovery::Lenient,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rigchat").join("config.json"))
    }
}
