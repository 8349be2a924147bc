//! # Sky Clock Core Library
//!
//! This library renders a digital clock face with date and current-weather
//! overlay onto a small, round-or-rectangular display. It targets always-on
//! wearable-class hardware, where the display spends most of its life in a
//! low-power ambient state and every unnecessary redraw costs battery.
//!
//! ## Design Philosophy
//!
//! ### Power Awareness
//! - **Ambient mode** renders the bare minimum (hours:minutes and date on a
//!   flat dark fill) and relies on an external once-per-minute tick
//! - **Interactive mode** shows live seconds and the weather section, driven
//!   by a timer aligned to wall-clock second boundaries so frames land
//!   exactly when the displayed second changes
//! - **No redundant work**: every state mutator is a no-op when handed a
//!   value equal to the current one, so repeated platform callbacks cannot
//!   cause redraw storms or timer churn
//!
//! ### Deterministic Layout
//! Layout is a pure function of screen geometry, display mode, a clock
//! reading and a weather snapshot. It produces a [`layout::RenderPlan`], an
//! ordered list of positioned draw primitives, and nothing else. The same
//! inputs always yield the same plan, which is what makes the rendering
//! path testable without hardware.
//!
//! ### Data Flow
//! 1. Platform callbacks (visibility, ambient, insets, weather, timezone)
//!    feed the [`controller::DisplayModeController`]
//! 2. The controller re-evaluates the [`scheduler::RedrawScheduler`] and
//!    requests a redraw through the host port
//! 3. The embedder answers a redraw request by asking the controller to
//!    render: [`layout::LayoutEngine`] computes a plan, and
//!    [`render::execute_plan`] replays it onto a [`render::Surface`]
//!
//! ## Core Types
//!
//! The crate root exports the screen description shared by every module:
//! - [`DisplayGeometry`]: pixel dimensions plus the round/rectangular flag
//! - [`DisplayMode`]: ambient and low-bit-ambient state

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Module declarations
pub mod clock;
pub mod config;
pub mod controller;
pub mod layout;
pub mod render;
pub mod scheduler;
pub mod weather;

/// Physical outline of the display panel.
///
/// Round panels need a larger top offset before the first text baseline so
/// the clock clears the bezel curvature; rectangular panels can start
/// higher. The shape never changes at runtime on real hardware, but it is
/// delivered late (with the window insets), so it lives in
/// [`DisplayGeometry`] rather than in a compile-time parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenShape {
    /// Circular panel, e.g. a classic watch dial
    Round,
    /// Rectangular or square panel
    Rectangular,
}

/// Error raised when a caller supplies an unusable screen description.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// Width or height was zero
    #[error("display dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
}

/// Pixel dimensions and shape of the target display.
///
/// Supplied once at startup and again whenever the platform delivers new
/// window insets. Dimensions are validated on construction: a zero-sized
/// screen is a caller bug and fails fast rather than producing a degenerate
/// layout downstream.
///
/// # Example
/// ```
/// use sky_clock_lib::{DisplayGeometry, ScreenShape};
///
/// let geometry = DisplayGeometry::new(320, 320, ScreenShape::Round).unwrap();
/// assert_eq!(geometry.center_x(), 160.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// Round or rectangular outline
    pub shape: ScreenShape,
}

impl DisplayGeometry {
    /// Build a validated geometry. Zero dimensions are rejected.
    pub fn new(width: u32, height: u32, shape: ScreenShape) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            shape,
        })
    }

    /// Horizontal center of the panel, the anchor for all centered text.
    pub fn center_x(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

/// Current power/content state of the display.
///
/// Mutated only by [`controller::DisplayModeController`] in response to
/// platform callbacks. `low_bit_ambient` is a capability flag, not a mode:
/// it reports that the panel drops to few intensity levels while ambient,
/// which requires anti-aliasing to be off in that state to avoid fringing.
/// It is only consulted while `ambient` is true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayMode {
    /// Low-power state: reduced content, dark background, no seconds
    pub ambient: bool,
    /// Panel renders few color/intensity levels while ambient
    pub low_bit_ambient: bool,
}

impl DisplayMode {
    /// Full-power state with per-second refresh.
    pub fn is_interactive(&self) -> bool {
        !self.ambient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_zero_dimensions() {
        assert_eq!(
            DisplayGeometry::new(0, 300, ScreenShape::Rectangular),
            Err(GeometryError::EmptyDimensions {
                width: 0,
                height: 300
            })
        );
        assert!(DisplayGeometry::new(400, 0, ScreenShape::Round).is_err());
        assert!(DisplayGeometry::new(1, 1, ScreenShape::Round).is_ok());
    }

    #[test]
    fn interactive_is_ambient_complement() {
        let mut mode = DisplayMode::default();
        assert!(mode.is_interactive());
        mode.ambient = true;
        assert!(!mode.is_interactive());
    }
}
