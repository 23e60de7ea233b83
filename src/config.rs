//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! clock-config.toml file. It covers the display surface, where the image and
//! font assets live, and where diagnostics are written.
//!
//! Every section has defaults matching the kiosk installation, so a missing
//! or broken file still yields a working clock.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "clock-config.toml";

/// Application configuration loaded from clock-config.toml
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Output surface configuration
    pub display: DisplayConfig,
    /// Image and font locations
    pub assets: AssetsConfig,
    /// Diagnostic log files
    pub logging: LoggingConfig,
}

/// Output surface configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
    /// Window title when running in a desktop window
    pub title: String,
    /// Pause between frames when there is no vsync to pace the loop
    pub frame_interval_ms: u64,
    /// Pixel scale of the desktop window
    pub scale: u32,
}

/// Image and font locations
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding Background.png, Foreground_Left.png,
    /// Foreground_Right.png, Sun.png and Moon.png
    pub asset_dir: PathBuf,
    /// TrueType font used for the time and date
    pub font_path: PathBuf,
    /// Point size of the time line
    pub time_point_size: u32,
    /// Point size of the date line
    pub date_point_size: u32,
}

/// Diagnostic log files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
    pub backtrace_file: PathBuf,
    /// Mirror every diagnostic line to the console
    pub print_cli: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 1920,
            height: 1080,
            title: "Ambient Clock".to_string(),
            frame_interval_ms: 16, // ~60 fps
            scale: 1,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        AssetsConfig {
            asset_dir: PathBuf::from("/var/mrh/mrangeui"),
            font_path: PathBuf::from("/var/mrh/mrangeui/Font.ttf"),
            time_point_size: 156,
            date_point_size: 48,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_file: PathBuf::from("/var/log/mrh/mrangeui.log"),
            backtrace_file: PathBuf::from("/var/log/mrh/bt_mrangeui.log"),
            print_cli: false,
        }
    }
}

impl Config {
    /// Load configuration from clock-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!(
                        "Loaded configuration from {} ({}x{})",
                        path.display(),
                        config.display.width,
                        config.display.height
                    );
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config file format in {}: {}", path.display(), e);
                    log::warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file found at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
