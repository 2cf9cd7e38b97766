use crate::color::ColorScheme;
use crate::settings::{SimulationSettings, MAX_DISPLAY_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current on-disk config format
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config version {0} (expected {})", CONFIG_VERSION)]
    UnsupportedVersion(u32),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,
    pub settings: SimulationSettings,
    pub color_scheme: ColorScheme,
    /// Degrees per tilt key press
    pub tilt_step: f32,
    /// Display size in pixels
    pub width: usize,
    pub height: usize,
}

impl AppConfig {
    /// Write the config as pretty JSON, creating missing parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a config; settings are clamped into range
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }
        config.settings = config.settings.sanitized();
        config.width = config.width.clamp(1, MAX_DISPLAY_SIZE);
        config.height = config.height.clamp(1, MAX_DISPLAY_SIZE);
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: SimulationSettings::default(),
            color_scheme: ColorScheme::default(),
            tilt_step: 15.0,
            width: 64,
            height: 32,
        }
    }
}
