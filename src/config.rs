//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the sky-clock.toml
//! file. It centralizes the knobs that would otherwise come from a platform
//! resource system: panel geometry, theme colors, and the shape-dependent
//! vertical offset of the clock text.

use crate::layout::Color;
use crate::ScreenShape;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from sky-clock.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Panel geometry configuration
    pub display: DisplayConfig,
    /// Colors and layout tuning
    pub theme: ThemeConfig,
}

/// Target panel configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// Panel outline: "round" or "rectangular"
    pub shape: ScreenShape,
}

/// Theme and layout tuning configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct ThemeConfig {
    /// Interactive-mode background fill as "#RRGGBB"
    pub background: String,
    /// Text color as "#RRGGBB"
    pub text: String,
    /// Time baseline as a fraction of panel height on rectangular panels
    pub time_baseline_rect: f32,
    /// Time baseline fraction on round panels; larger, to clear the bezel
    pub time_baseline_round: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            display: DisplayConfig {
                width: 320,
                height: 320,
                shape: ScreenShape::Round,
            },
            theme: ThemeConfig {
                background: "#03A9F4".to_string(), // daylight blue
                text: "#FFFFFF".to_string(),
                time_baseline_rect: 0.32,
                time_baseline_round: 0.40,
            },
        }
    }
}

impl ThemeConfig {
    /// Parsed background color; falls back to the default theme on a
    /// malformed hex string rather than failing the whole config.
    pub fn background_color(&self) -> Color {
        parse_or_default(&self.background, Color::rgb(0x03, 0xA9, 0xF4))
    }

    /// Parsed text color with the same fallback behavior.
    pub fn text_color(&self) -> Color {
        parse_or_default(&self.text, Color::rgb(0xFF, 0xFF, 0xFF))
    }
}

fn parse_or_default(hex: &str, fallback: Color) -> Color {
    match Color::from_hex(hex) {
        Some(color) => color,
        None => {
            warn!("invalid color {:?} in config, using default", hex);
            fallback
        }
    }
}

impl Config {
    /// Load configuration from the sky-clock.toml file
    /// Falls back to default configuration if the file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("sky-clock.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if the file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "loaded configuration: {}x{} {:?} panel",
                        config.display.width, config.display.height, config.display.shape
                    );
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {}", e);
                    warn!("using default configuration (320x320 round)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration (320x320 round)");
                Self::default()
            }
        }
    }

    /// Save current configuration to sky-clock.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("sky-clock.toml", contents)?;
        info!("configuration saved to sky-clock.toml");
        Ok(())
    }
}
