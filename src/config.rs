//! Configuration management for Response Timing
//!
//! Persistent settings for the display geometry and session defaults,
//! saved to and loaded from a platform-specific config file.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/response-timing/config.toml` |
//! | macOS | `~/Library/Application Support/response-timing/config.toml` |
//! | Windows | `%APPDATA%\response-timing\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use response_timing::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.monitor.distance_cm = Some(60.0);
//! config.save().expect("Failed to save config");
//! ```

use crate::error::TimingError;
use crate::hub::{Button, DEFAULT_BUFFER_CAPACITY};
use crate::units::{MonitorGeometry, Unit};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file, creating its directory if needed.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("response-timing");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Display the mouse positions refer to
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Keyboard session defaults
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    /// Mouse session defaults
    #[serde(default)]
    pub mouse: MouseConfig,
    /// Device hub settings
    #[serde(default)]
    pub hub: HubConfig,
}

/// Display geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Width and height in pixels
    pub size_pix: [u32; 2],
    /// Physical width of the visible area
    pub width_cm: f64,
    /// Viewing distance; needed only for degree conversions
    #[serde(default)]
    pub distance_cm: Option<f64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let geometry = MonitorGeometry::default();
        Self {
            size_pix: geometry.size_pix(),
            width_cm: geometry.width_cm(),
            distance_cm: geometry.distance_cm(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeyboardConfig {
    /// Keys to register; empty registers every key
    #[serde(default)]
    pub key_list: Vec<String>,
    #[serde(default)]
    pub release_as_unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MouseConfig {
    /// Unit of reported positions
    pub units: Unit,
    /// Buttons to register; empty registers every button
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default)]
    pub include_drag: bool,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            units: Unit::Pix,
            buttons: Vec::new(),
            include_drag: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    /// Sleep between device polls while waiting (in milliseconds)
    pub poll_interval_ms: u64,
    /// Unread events kept per device before the oldest are dropped
    pub buffer_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validated display geometry
    pub fn monitor_geometry(&self) -> Result<MonitorGeometry, TimingError> {
        MonitorGeometry::new(
            self.monitor.size_pix,
            self.monitor.width_cm,
            self.monitor.distance_cm,
        )
    }

    /// Sleep between polls in blocking waits
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.hub.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.monitor.size_pix, [1920, 1080]);
        assert_eq!(config.monitor.distance_cm, Some(57.0));
        assert!(config.keyboard.key_list.is_empty());
        assert_eq!(config.mouse.units, Unit::Pix);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.monitor.width_cm = 34.5;
        config.keyboard.key_list = vec!["f".to_string(), "j".to_string()];
        config.mouse.units = Unit::Deg;
        config.mouse.buttons = vec![Button::Left];

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn config_load_missing_file_errors() {
        let dir = tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[monitor]\nsize_pix = [800, 600]\nwidth_cm = 30.0\n\n[mouse]\nunits = \"pixel\"\nbuttons = [\"scroll\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.monitor.distance_cm, None);
        assert_eq!(config.mouse.units, Unit::Pix);
        assert_eq!(config.mouse.buttons, vec![Button::Middle]);
        assert_eq!(config.hub, HubConfig::default());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[monitor\nsize_pix = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn hub_table_may_set_only_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[hub]\nbuffer_capacity = 64\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hub.buffer_capacity, 64);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn geometry_is_validated() {
        let mut config = Config::default();
        assert!(config.monitor_geometry().is_ok());
        config.monitor.width_cm = 0.0;
        assert!(matches!(
            config.monitor_geometry(),
            Err(TimingError::MissingGeometry { .. })
        ));
    }
}
