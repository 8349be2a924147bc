//! # Weather State and Icon Lookup
//!
//! The face never fetches weather itself; an external collaborator resolves
//! conditions and temperatures and pushes a [`WeatherSnapshot`] into the
//! controller. This module defines the fixed condition vocabulary, the
//! snapshot type, and the icon lookup seam. Icon *absence* is a valid,
//! handled state: a condition with no icon simply drops the weather section
//! from the frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of weather condition keys the face understands.
///
/// The string form is the kebab-case key used in config files and update
/// payloads ("light-rain", "storm", ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherKind {
    Clear,
    Cloudy,
    Fog,
    LightClouds,
    LightRain,
    Rain,
    Snow,
    Storm,
}

impl WeatherKind {
    /// All known conditions, in display-priority order.
    pub const ALL: [WeatherKind; 8] = [
        WeatherKind::Clear,
        WeatherKind::Cloudy,
        WeatherKind::Fog,
        WeatherKind::LightClouds,
        WeatherKind::LightRain,
        WeatherKind::Rain,
        WeatherKind::Snow,
        WeatherKind::Storm,
    ];

    /// Stable kebab-case key for this condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherKind::Clear => "clear",
            WeatherKind::Cloudy => "cloudy",
            WeatherKind::Fog => "fog",
            WeatherKind::LightClouds => "light-clouds",
            WeatherKind::LightRain => "light-rain",
            WeatherKind::Rain => "rain",
            WeatherKind::Snow => "snow",
            WeatherKind::Storm => "storm",
        }
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeatherKind {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCondition(s.to_string()))
    }
}

/// Error for a condition key outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCondition(pub String);

impl fmt::Display for UnknownCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weather condition key: {}", self.0)
    }
}

impl std::error::Error for UnknownCondition {}

/// Already-resolved weather to overlay on the face.
///
/// Temperatures are whole degrees; the unit is whatever the upstream
/// provider resolved to and is not re-interpreted here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeatherSnapshot {
    /// Current condition
    pub condition: WeatherKind,
    /// Forecast high, whole degrees
    pub high_temp: i32,
    /// Forecast low, whole degrees
    pub low_temp: i32,
}

impl Default for WeatherSnapshot {
    // Matches the state of a face that has never received an update
    fn default() -> Self {
        WeatherSnapshot {
            condition: WeatherKind::Clear,
            high_temp: 0,
            low_temp: 0,
        }
    }
}

/// Pixel footprint of a weather icon, as needed by layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconInfo {
    pub width: f32,
    pub height: f32,
}

/// Resolves a condition to an icon, or to nothing.
///
/// Missing icons are expected (a stripped-down build may only ship a few),
/// so the return is an `Option`, not an error.
pub trait IconLookup {
    fn lookup(&self, condition: WeatherKind) -> Option<IconInfo>;
}

/// The built-in primitive-drawn icon set: every condition, one fixed size.
///
/// The concrete pixels live in the render surface; layout only needs the
/// footprint, which is uniform across the set.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinIcons {
    size: f32,
}

impl BuiltinIcons {
    pub const DEFAULT_SIZE: f32 = 24.0;

    pub fn new() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Icon set scaled to an edge length other than the default.
    pub fn with_size(size: f32) -> Self {
        Self { size }
    }
}

impl Default for BuiltinIcons {
    fn default() -> Self {
        Self::new()
    }
}

impl IconLookup for BuiltinIcons {
    fn lookup(&self, _condition: WeatherKind) -> Option<IconInfo> {
        Some(IconInfo {
            width: self.size,
            height: self.size,
        })
    }
}
