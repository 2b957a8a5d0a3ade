use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PROGRESS_EVENT_DELAY_MS,
    DEFAULT_REPLY_TIMEOUT_SECS, DEFAULT_VOLUME,
};
use crate::player::{PlayerProps, Source};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 0 waits forever
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default)]
    pub replay: bool,

    #[serde(default = "default_progress_event_delay")]
    pub progress_event_delay_ms: u64,
}

impl Config {
    /// Load from the user config directory, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config = Self::from_toml_str(&contents)?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        match self.bridge.reply_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Starting player properties for a freshly mounted view
    pub fn initial_props(&self, source: impl Into<Source>) -> PlayerProps {
        PlayerProps {
            source: source.into(),
            replay: self.playback.replay,
            volume: self.playback.volume.clamp(0.0, 1.0),
            progress_event_delay: Duration::from_millis(self.playback.progress_event_delay_ms),
            ..Default::default()
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: default_reply_timeout(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            replay: false,
            progress_event_delay_ms: default_progress_event_delay(),
        }
    }
}

// Default value functions
fn default_reply_timeout() -> u64 { DEFAULT_REPLY_TIMEOUT_SECS }
fn default_volume() -> f64 { DEFAULT_VOLUME }
fn default_progress_event_delay() -> u64 { DEFAULT_PROGRESS_EVENT_DELAY_MS }
