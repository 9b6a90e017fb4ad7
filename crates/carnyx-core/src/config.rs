use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BITRATE_KBPS: u32 = 192;
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub audio_format: AudioFormat,
    pub bitrate_kbps: u32,
    pub workers: usize,
    pub item_timeout_secs: u64,
    pub yt_dlp: PathBuf,
    pub cleanup_partial: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::Mp3,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            workers: 1,
            item_timeout_secs: DEFAULT_ITEM_TIMEOUT_SECS,
            yt_dlp: PathBuf::from("yt-dlp"),
            cleanup_partial: true,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.workers == 0 {
            return Err(ConfigValidationError::NoWorkers);
        }
        if self.bitrate_kbps == 0 {
            return Err(ConfigValidationError::InvalidBitrate);
        }
        if self.item_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.yt_dlp.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingHelper);
        }
        Ok(())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigValidationError> {
        let config: SyncConfig =
            toml::from_str(raw).map_err(|err| ConfigValidationError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ConfigValidationError::Parse(format!("{}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }

    pub fn extension(&self) -> &'static str {
        self.audio_format.extension()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Codec name understood by the acquisition helper.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("at least one worker is required")]
    NoWorkers,
    #[error("bitrate must be positive")]
    InvalidBitrate,
    #[error("item timeout must be positive")]
    InvalidTimeout,
    #[error("path of the yt-dlp helper must be provided")]
    MissingHelper,
    #[error("invalid configuration file: {0}")]
    Parse(String),
}
