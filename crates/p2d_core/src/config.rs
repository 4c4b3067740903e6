//! Game configuration, read from JSON with every field optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Platformer2D".to_string(),
            width: 800,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    /// Directory holding `0.txt`, `1.txt`, ... level layouts.
    pub level_dir: PathBuf,
    /// Application-private directory for `save.json`.
    pub save_dir: PathBuf,
    pub music_track: String,
    pub time_limit_secs: u64,
    pub warning_time_secs: u64,
    pub magnifier_factor: f32,
    pub fixed_dt: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            level_dir: PathBuf::from("assets/levels"),
            save_dir: PathBuf::from("saves"),
            music_track: "assets/sounds/music.wav".to_string(),
            time_limit_secs: 120,
            warning_time_secs: 30,
            magnifier_factor: 0.2,
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl GameConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn warning_time(&self) -> Duration {
        Duration::from_secs(self.warning_time_secs)
    }

    /// Load from `path`, or fall back to defaults when the file is missing or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match load_config_from_path(path) {
            Ok(config) => {
                log::info!("Config loaded from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("{err}. Using default config.");
                Self::default()
            }
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.window.width == 0 || config.window.height == 0 {
        return Err("Config validation failed: window size must be > 0".to_string());
    }
    if config.fixed_dt <= 0.0 {
        return Err("Config validation failed: fixed_dt must be > 0".to_string());
    }
    if config.time_limit_secs == 0 {
        return Err("Config validation failed: time_limit_secs must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&config.magnifier_factor) {
        return Err("Config validation failed: magnifier_factor must be within 0..=1".to_string());
    }
    Ok(())
}
