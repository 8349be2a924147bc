//! # Face Layout Computation
//!
//! This module turns a point-in-time snapshot of clock, date, and weather
//! state plus screen geometry into a [`RenderPlan`]: a fully resolved,
//! ordered list of draw primitives. It is deliberately pure (no clocks, no
//! surfaces, no stored state beyond style constants) so every positioning
//! rule can be tested against fake text metrics.
//!
//! Layout rules, top to bottom:
//! 1. Background fill (flat dark while ambient, themed otherwise)
//! 2. Hours:minutes centered on the panel's vertical axis, baseline at a
//!    shape-dependent fraction of the height
//! 3. Seconds at half size immediately right of the time (interactive only)
//! 4. Date line centered below the time baseline
//! 5. Weather section (interactive only, and only when an icon exists for
//!    the current condition): separator line, then icon + high + low laid
//!    out left-to-right and centered as one block

use crate::clock::ClockReading;
use crate::config::Config;
use crate::weather::{IconLookup, WeatherKind, WeatherSnapshot};
use crate::{DisplayGeometry, DisplayMode, ScreenShape};

/// 24-bit RGB color carried by draw primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse "#RRGGBB". Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Color {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        })
    }

    /// This color at `alpha` (0.0–1.0) over a black background.
    pub fn dimmed(self, alpha: f32) -> Self {
        let scale = alpha.clamp(0.0, 1.0);
        Color {
            r: (self.r as f32 * scale) as u8,
            g: (self.g as f32 * scale) as u8,
            b: (self.b as f32 * scale) as u8,
        }
    }
}

/// Which text slot a primitive belongs to.
///
/// Surfaces map roles to fonts; layout maps them to positions. The role is
/// the whole "style reference"; there is no shared mutable paint object to
/// toggle between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// The large hours:minutes digits
    HoursMinutes,
    /// Live seconds, half the time text size
    Seconds,
    /// The date line
    Date,
    /// Forecast high, bold
    HighTemp,
    /// Forecast low, reduced opacity
    LowTemp,
}

/// Immutable per-primitive text style, resolved at layout time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub role: FontRole,
    pub color: Color,
    /// Smooth glyph edges. Off only for the time/date slots while ambient on
    /// low-bit panels.
    pub anti_alias: bool,
}

/// Measured extent of a rendered string.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBounds {
    pub width: f32,
    pub height: f32,
}

/// Text measurement seam, implemented by every render surface.
pub trait TextMetrics {
    /// Advance width of `text` in the given style.
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;

    /// Tight glyph bounds of `text` in the given style.
    fn text_bounds(&self, text: &str, style: &TextStyle) -> TextBounds;
}

/// One draw primitive with resolved pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Whole-panel background fill
    Fill { color: Color },
    /// Text anchored at its left edge and baseline
    Text {
        text: String,
        left: f32,
        baseline: f32,
        style: TextStyle,
    },
    /// Straight line segment
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    },
    /// Weather icon anchored at its top-left corner
    Icon {
        condition: WeatherKind,
        left: f32,
        top: f32,
    },
}

/// Ordered draw primitives for one frame.
///
/// Produced fresh on every layout pass and replaced wholesale; a plan is
/// never patched in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    ops: Vec<DrawOp>,
}

impl RenderPlan {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// All text ops with the given role, for assertions and debugging.
    pub fn texts_with_role(&self, role: FontRole) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, style, .. } if style.role == role => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any op in the plan is part of the weather section.
    pub fn has_weather_section(&self) -> bool {
        self.ops.iter().any(|op| {
            matches!(op, DrawOp::Icon { .. } | DrawOp::Line { .. })
                || matches!(
                    op,
                    DrawOp::Text { style, .. }
                        if style.role == FontRole::HighTemp || style.role == FontRole::LowTemp
                )
        })
    }
}

/// Fixed spacing constants and baseline fractions.
///
/// Values mirror a hand-tuned 320px-class face; the baselines are fractions
/// so the same constants hold across panel sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Gap between the time text and the seconds text
    pub seconds_margin_left: f32,
    /// Gap between the time baseline and the top of the date glyphs
    pub date_margin_top: f32,
    /// Gap between the date baseline and the separator line
    pub separator_margin_top: f32,
    /// Gap between the separator line and the top of the weather icon
    pub separator_margin_bottom: f32,
    /// Gap right of the weather icon
    pub icon_margin_right: f32,
    /// Gap right of the high-temperature text
    pub high_temp_margin_right: f32,
    /// Time baseline as a fraction of panel height, rectangular panels
    pub time_baseline_rect: f32,
    /// Time baseline fraction, round panels (larger, clears the bezel)
    pub time_baseline_round: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            seconds_margin_left: 2.0,
            date_margin_top: 5.0,
            separator_margin_top: 25.0,
            separator_margin_bottom: 10.0,
            icon_margin_right: 25.0,
            high_temp_margin_right: 10.0,
            time_baseline_rect: 0.32,
            time_baseline_round: 0.40,
        }
    }
}

/// Interactive-mode palette.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::rgb(0x03, 0xA9, 0xF4),
            text: Color::WHITE,
        }
    }
}

/// Low-temperature opacity over the themed background.
const LOW_TEMP_ALPHA: f32 = 200.0 / 255.0;

/// Separator line length as a fraction of panel width.
const SEPARATOR_WIDTH_FRACTION: f32 = 1.0 / 3.0;

/// Pure layout engine: style constants in, [`RenderPlan`] out.
#[derive(Clone, Debug, Default)]
pub struct LayoutEngine {
    theme: Theme,
    params: LayoutParams,
}

impl LayoutEngine {
    pub fn new(theme: Theme, params: LayoutParams) -> Self {
        Self { theme, params }
    }

    /// Engine configured from the loaded TOML config.
    pub fn from_config(config: &Config) -> Self {
        let theme = Theme {
            background: config.theme.background_color(),
            text: config.theme.text_color(),
        };
        let params = LayoutParams {
            time_baseline_rect: config.theme.time_baseline_rect,
            time_baseline_round: config.theme.time_baseline_round,
            ..LayoutParams::default()
        };
        Self::new(theme, params)
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Compute the draw plan for one frame.
    ///
    /// Deterministic in its inputs: no randomness, no state carried between
    /// calls. The weather section is emitted only in interactive mode and
    /// only when `icons` resolves the current condition.
    pub fn compute<M, I>(
        &self,
        geometry: DisplayGeometry,
        mode: DisplayMode,
        clock: &ClockReading,
        weather: &WeatherSnapshot,
        metrics: &M,
        icons: &I,
    ) -> RenderPlan
    where
        M: TextMetrics + ?Sized,
        I: IconLookup + ?Sized,
    {
        let mut plan = RenderPlan::default();
        let center_x = geometry.center_x();

        // 1. Background
        let background = if mode.ambient {
            Color::BLACK
        } else {
            self.theme.background
        };
        plan.push(DrawOp::Fill { color: background });

        // Low-bit panels cannot render smooth edges while ambient; everywhere
        // else anti-aliasing stays on.
        let time_anti_alias = if mode.low_bit_ambient {
            !mode.ambient
        } else {
            true
        };

        let time_style = TextStyle {
            role: FontRole::HoursMinutes,
            color: self.theme.text,
            anti_alias: time_anti_alias,
        };
        let date_style = TextStyle {
            role: FontRole::Date,
            color: self.theme.text,
            anti_alias: time_anti_alias,
        };

        // 2. Hours:minutes, centered
        let time_text = clock.hours_minutes_text();
        let time_width = metrics.text_width(&time_text, &time_style);
        let time_left = center_x - time_width / 2.0;
        let time_baseline = geometry.height as f32 * self.time_baseline_fraction(geometry.shape);
        plan.push(DrawOp::Text {
            text: time_text,
            left: time_left,
            baseline: time_baseline,
            style: time_style,
        });

        // 3. Seconds, interactive only, same baseline as the time
        if mode.is_interactive() {
            let seconds_style = TextStyle {
                role: FontRole::Seconds,
                color: self.theme.text,
                anti_alias: true,
            };
            plan.push(DrawOp::Text {
                text: clock.seconds_text(),
                left: time_left + time_width + self.params.seconds_margin_left,
                baseline: time_baseline,
                style: seconds_style,
            });
        }

        // 4. Date, centered, baseline below the time by its own glyph height
        let date_bounds = metrics.text_bounds(&clock.date_text, &date_style);
        let date_left = center_x - date_bounds.width / 2.0;
        let date_baseline = time_baseline + date_bounds.height + self.params.date_margin_top;
        plan.push(DrawOp::Text {
            text: clock.date_text.clone(),
            left: date_left,
            baseline: date_baseline,
            style: date_style,
        });

        // 5. Weather section: interactive only, and only with a known icon
        if mode.is_interactive() {
            if let Some(icon) = icons.lookup(weather.condition) {
                // 5a. Separator, one third of the panel width
                let separator_width = geometry.width as f32 * SEPARATOR_WIDTH_FRACTION;
                let separator_left = center_x - separator_width / 2.0;
                let separator_y = date_baseline + self.params.separator_margin_top;
                plan.push(DrawOp::Line {
                    x1: separator_left,
                    y1: separator_y,
                    x2: separator_left + separator_width,
                    y2: separator_y,
                    color: self.theme.text,
                });

                // 5b. Temperature strings
                let high_style = TextStyle {
                    role: FontRole::HighTemp,
                    color: self.theme.text,
                    anti_alias: true,
                };
                let low_style = TextStyle {
                    role: FontRole::LowTemp,
                    color: self.theme.text.dimmed(LOW_TEMP_ALPHA),
                    anti_alias: true,
                };
                let high_text = format!("{}\u{00B0}", weather.high_temp);
                let low_text = format!("{}\u{00B0}", weather.low_temp);

                let high_bounds = metrics.text_bounds(&high_text, &high_style);
                let high_width = high_bounds.width;
                let low_width = metrics.text_width(&low_text, &low_style);

                // 5c. Icon + temps centered as one block
                let block_width = icon.width
                    + self.params.icon_margin_right
                    + high_width
                    + self.params.high_temp_margin_right
                    + low_width;
                let icon_left = center_x - block_width / 2.0;
                let icon_top = separator_y + self.params.separator_margin_bottom;
                let high_left = icon_left + icon.width + self.params.icon_margin_right;
                let low_left = high_left + high_width + self.params.high_temp_margin_right;
                // The low-temp glyph height is assumed equal to the measured
                // high-temp height; both strings share one baseline.
                let temp_baseline = icon_top + icon.height / 2.0 + high_bounds.height / 2.0;

                plan.push(DrawOp::Icon {
                    condition: weather.condition,
                    left: icon_left,
                    top: icon_top,
                });
                plan.push(DrawOp::Text {
                    text: high_text,
                    left: high_left,
                    baseline: temp_baseline,
                    style: high_style,
                });
                plan.push(DrawOp::Text {
                    text: low_text,
                    left: low_left,
                    baseline: temp_baseline,
                    style: low_style,
                });
            }
        }

        plan
    }

    fn time_baseline_fraction(&self, shape: ScreenShape) -> f32 {
        match shape {
            ScreenShape::Round => self.params.time_baseline_round,
            ScreenShape::Rectangular => self.params.time_baseline_rect,
        }
    }
}
