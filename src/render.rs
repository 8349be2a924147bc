//! # Render Plan Execution
//!
//! A [`RenderPlan`] is an abstract frame; this module replays it onto a
//! concrete surface. Two surfaces ship with the crate:
//!
//! - [`EgSurface`] draws onto any `embedded-graphics` `DrawTarget` with
//!   `Rgb565` color: a framebuffer, a display driver, or `MockDisplay` in
//!   tests. Text uses fixed mono fonts (one per [`FontRole`]), weather icons
//!   are sketched from primitives so no bitmap assets are needed.
//! - [`TermSurface`] projects the frame onto a character grid for terminal
//!   development mode.
//!
//! Both implement [`TextMetrics`], because layout needs the same glyph
//! geometry the surface will draw with.

use crate::layout::{Color, DrawOp, FontRole, RenderPlan, TextBounds, TextMetrics, TextStyle};
use crate::weather::WeatherKind;
use crate::DisplayGeometry;
use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10, FONT_9X15, FONT_9X15_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::Text,
};
use std::convert::Infallible;
use std::fmt;

/// An output device the executor can replay a plan onto.
///
/// Mirrors the primitive vocabulary of [`DrawOp`] one-to-one. Implementors
/// also provide text measurement so the same object can back the layout
/// pass and the draw pass of a frame.
pub trait Surface: TextMetrics {
    type Error;

    /// Fill the whole panel.
    fn fill_background(&mut self, color: Color) -> Result<(), Self::Error>;

    /// Draw text anchored at its left edge and alphabetic baseline.
    fn draw_text(
        &mut self,
        text: &str,
        left: f32,
        baseline: f32,
        style: &TextStyle,
    ) -> Result<(), Self::Error>;

    /// Draw a one-pixel line segment.
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color)
        -> Result<(), Self::Error>;

    /// Draw the icon for `condition` anchored at its top-left corner.
    fn draw_icon(&mut self, condition: WeatherKind, left: f32, top: f32)
        -> Result<(), Self::Error>;
}

/// Replay `plan` onto `surface`, in order.
pub fn execute_plan<S: Surface + ?Sized>(plan: &RenderPlan, surface: &mut S) -> Result<(), S::Error> {
    for op in plan.ops() {
        match op {
            DrawOp::Fill { color } => surface.fill_background(*color)?,
            DrawOp::Text {
                text,
                left,
                baseline,
                style,
            } => surface.draw_text(text, *left, *baseline, style)?,
            DrawOp::Line { x1, y1, x2, y2, color } => {
                surface.draw_line(*x1, *y1, *x2, *y2, *color)?
            }
            DrawOp::Icon { condition, left, top } => {
                surface.draw_icon(*condition, *left, *top)?
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// embedded-graphics surface
// ---------------------------------------------------------------------------

/// Icon palette: fixed, not themed, like a bitmap icon pack would be.
const SUN: Color = Color::rgb(0xFF, 0xC1, 0x07);
const CLOUD: Color = Color::rgb(0xEC, 0xEF, 0xF1);
const RAIN_DROP: Color = Color::rgb(0x4F, 0xC3, 0xF7);
const FOG_BAND: Color = Color::rgb(0xB0, 0xBE, 0xC5);
const BOLT: Color = Color::rgb(0xFF, 0xEB, 0x3B);

fn font_for(role: FontRole) -> &'static MonoFont<'static> {
    // iso_8859_1 variants so the degree sign renders
    match role {
        FontRole::HoursMinutes => &FONT_10X20,
        FontRole::Seconds => &FONT_6X10,
        FontRole::Date => &FONT_6X10,
        FontRole::HighTemp => &FONT_9X15_BOLD,
        FontRole::LowTemp => &FONT_9X15,
    }
}

fn rgb565(color: Color) -> Rgb565 {
    Rgb565::new(color.r >> 3, color.g >> 2, color.b >> 3)
}

/// Surface backed by any `Rgb565` draw target.
///
/// Mono bitmap fonts have no anti-aliased edges to disable, so the style's
/// `anti_alias` flag is accepted and ignored here; surfaces with scalable
/// text honor it.
pub struct EgSurface<D> {
    target: D,
    icon_size: i32,
}

impl<D> EgSurface<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            icon_size: 24,
        }
    }

    /// Give the wrapped target back, e.g. to flush it to hardware.
    pub fn into_inner(self) -> D {
        self.target
    }

    fn fill_circle(&mut self, x: i32, y: i32, diameter: u32, color: Color) -> Result<(), D::Error> {
        Circle::new(Point::new(x, y), diameter)
            .into_styled(PrimitiveStyle::with_fill(rgb565(color)))
            .draw(&mut self.target)
    }

    fn stroke(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<(), D::Error> {
        Line::new(Point::new(x1, y1), Point::new(x2, y2))
            .into_styled(PrimitiveStyle::with_stroke(rgb565(color), 1))
            .draw(&mut self.target)
    }

    /// The shared cloud blob: two puffs over a flat base.
    fn cloud(&mut self, x: i32, y: i32) -> Result<(), D::Error> {
        let s = self.icon_size;
        self.fill_circle(x + s / 6, y + s / 4, (s / 2) as u32, CLOUD)?;
        self.fill_circle(x + s / 2, y + s / 3, (s * 2 / 5) as u32, CLOUD)?;
        Rectangle::new(
            Point::new(x + s / 6, y + s / 2),
            Size::new((s * 2 / 3) as u32, (s / 4) as u32),
        )
        .into_styled(PrimitiveStyle::with_fill(rgb565(CLOUD)))
        .draw(&mut self.target)
    }

    fn sun(&mut self, x: i32, y: i32, diameter: i32) -> Result<(), D::Error> {
        let r = diameter / 2;
        let cx = x + r;
        let cy = y + r;
        self.fill_circle(x, y, diameter as u32, SUN)?;
        // four rays
        self.stroke(cx, y - r / 2, cx, y - 1, SUN)?;
        self.stroke(cx, y + diameter + 1, cx, y + diameter + r / 2, SUN)?;
        self.stroke(x - r / 2, cy, x - 1, cy, SUN)?;
        self.stroke(x + diameter + 1, cy, x + diameter + r / 2, cy, SUN)
    }

    fn rain(&mut self, x: i32, y: i32, drops: i32, color: Color) -> Result<(), D::Error> {
        let s = self.icon_size;
        let top = y + s * 3 / 4 + 1;
        for i in 0..drops {
            let dx = x + s / 4 + i * s / 4;
            self.stroke(dx, top, dx - 1, top + s / 6, color)?;
        }
        Ok(())
    }
}

impl<D> TextMetrics for EgSurface<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        let font = font_for(style.role);
        let advance = font.character_size.width + font.character_spacing;
        let count = text.chars().count() as u32;
        if count == 0 {
            return 0.0;
        }
        (count * advance - font.character_spacing) as f32
    }

    fn text_bounds(&self, text: &str, style: &TextStyle) -> TextBounds {
        let font = font_for(style.role);
        TextBounds {
            width: self.text_width(text, style),
            // baseline offset approximates the tight glyph height for the
            // digits and capitals the face draws
            height: font.baseline as f32,
        }
    }
}

impl<D> Surface for EgSurface<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Error = D::Error;

    fn fill_background(&mut self, color: Color) -> Result<(), Self::Error> {
        self.target.clear(rgb565(color))
    }

    fn draw_text(
        &mut self,
        text: &str,
        left: f32,
        baseline: f32,
        style: &TextStyle,
    ) -> Result<(), Self::Error> {
        let character_style = MonoTextStyle::new(font_for(style.role), rgb565(style.color));
        // Text::new anchors at the alphabetic baseline
        Text::new(
            text,
            Point::new(left.round() as i32, baseline.round() as i32),
            character_style,
        )
        .draw(&mut self.target)?;
        Ok(())
    }

    fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    ) -> Result<(), Self::Error> {
        self.stroke(
            x1.round() as i32,
            y1.round() as i32,
            x2.round() as i32,
            y2.round() as i32,
            color,
        )
    }

    fn draw_icon(
        &mut self,
        condition: WeatherKind,
        left: f32,
        top: f32,
    ) -> Result<(), Self::Error> {
        let x = left.round() as i32;
        let y = top.round() as i32;
        let s = self.icon_size;
        match condition {
            WeatherKind::Clear => self.sun(x + s / 4, y + s / 4, s / 2),
            WeatherKind::LightClouds => {
                self.sun(x + s / 8, y + s / 8, s / 3)?;
                self.cloud(x + s / 6, y + s / 6)
            }
            WeatherKind::Cloudy => self.cloud(x, y + s / 8),
            WeatherKind::Fog => {
                for i in 0..3 {
                    let fy = y + s / 4 + i * s / 4;
                    self.stroke(x + s / 8, fy, x + s * 7 / 8, fy, FOG_BAND)?;
                }
                Ok(())
            }
            WeatherKind::LightRain => {
                self.cloud(x, y)?;
                self.rain(x, y, 2, RAIN_DROP)
            }
            WeatherKind::Rain => {
                self.cloud(x, y)?;
                self.rain(x, y, 3, RAIN_DROP)
            }
            WeatherKind::Snow => {
                self.cloud(x, y)?;
                let fy = y + s * 3 / 4 + 2;
                for i in 0..3 {
                    self.fill_circle(x + s / 4 + i * s / 4, fy, 2, Color::WHITE)?;
                }
                Ok(())
            }
            WeatherKind::Storm => {
                self.cloud(x, y)?;
                let cx = x + s / 2;
                let by = y + s * 5 / 8;
                self.stroke(cx, by, cx - s / 6, by + s / 5, BOLT)?;
                self.stroke(cx - s / 6, by + s / 5, cx + s / 8, by + s / 3, BOLT)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// terminal surface
// ---------------------------------------------------------------------------

/// Character-grid surface for development mode.
///
/// Each grid cell stands for a `width/cols` by `height/rows` pixel block, so
/// the centering computed by layout survives the projection. Text metrics
/// are expressed back in pixels for the same reason.
pub struct TermSurface {
    cols: usize,
    rows: usize,
    cell_w: f32,
    cell_h: f32,
    cells: Vec<char>,
}

impl TermSurface {
    const DEFAULT_COLS: usize = 48;
    const DEFAULT_ROWS: usize = 18;

    pub fn new(geometry: DisplayGeometry) -> Self {
        Self::with_grid(geometry, Self::DEFAULT_COLS, Self::DEFAULT_ROWS)
    }

    pub fn with_grid(geometry: DisplayGeometry, cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cell_w: geometry.width as f32 / cols as f32,
            cell_h: geometry.height as f32 / rows as f32,
            cells: vec![' '; cols * rows],
        }
    }

    fn put(&mut self, col: i64, row: i64, ch: char) {
        if col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows {
            self.cells[row as usize * self.cols + col as usize] = ch;
        }
    }

    fn col_of(&self, x: f32) -> i64 {
        (x / self.cell_w).floor() as i64
    }

    fn row_of(&self, y: f32) -> i64 {
        (y / self.cell_h).floor() as i64
    }

    /// Whether `needle` appears anywhere on the grid, for assertions.
    pub fn contains(&self, needle: &str) -> bool {
        self.to_grid_string().contains(needle)
    }

    fn to_grid_string(&self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in 0..self.rows {
            out.extend(&self.cells[row * self.cols..(row + 1) * self.cols]);
            out.push('\n');
        }
        out
    }
}

fn icon_char(condition: WeatherKind) -> char {
    match condition {
        WeatherKind::Clear => 'O',
        WeatherKind::Cloudy => '~',
        WeatherKind::Fog => '=',
        WeatherKind::LightClouds => 'o',
        WeatherKind::LightRain => ':',
        WeatherKind::Rain => '!',
        WeatherKind::Snow => '*',
        WeatherKind::Storm => 'Z',
    }
}

impl TextMetrics for TermSurface {
    fn text_width(&self, text: &str, _style: &TextStyle) -> f32 {
        text.chars().count() as f32 * self.cell_w
    }

    fn text_bounds(&self, text: &str, style: &TextStyle) -> TextBounds {
        TextBounds {
            width: self.text_width(text, style),
            height: self.cell_h,
        }
    }
}

impl Surface for TermSurface {
    type Error = Infallible;

    fn fill_background(&mut self, _color: Color) -> Result<(), Self::Error> {
        self.cells.fill(' ');
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        left: f32,
        baseline: f32,
        _style: &TextStyle,
    ) -> Result<(), Self::Error> {
        let row = self.row_of(baseline);
        let start = self.col_of(left);
        for (i, ch) in text.chars().enumerate() {
            self.put(start + i as i64, row, ch);
        }
        Ok(())
    }

    fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        _color: Color,
    ) -> Result<(), Self::Error> {
        let (c1, r1) = (self.col_of(x1), self.row_of(y1));
        let (c2, r2) = (self.col_of(x2), self.row_of(y2));
        let steps = (c2 - c1).abs().max((r2 - r1).abs()).max(1);
        let ch = if r1 == r2 {
            '-'
        } else if c1 == c2 {
            '|'
        } else {
            '*'
        };
        for i in 0..=steps {
            let col = c1 + (c2 - c1) * i / steps;
            let row = r1 + (r2 - r1) * i / steps;
            self.put(col, row, ch);
        }
        Ok(())
    }

    fn draw_icon(
        &mut self,
        condition: WeatherKind,
        left: f32,
        top: f32,
    ) -> Result<(), Self::Error> {
        let col = self.col_of(left);
        let row = self.row_of(top);
        self.put(col, row, '[');
        self.put(col + 1, row, icon_char(condition));
        self.put(col + 2, row, ']');
        Ok(())
    }
}

impl fmt::Display for TermSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_grid_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockReading;
    use crate::layout::LayoutEngine;
    use crate::weather::{BuiltinIcons, WeatherSnapshot};
    use crate::{DisplayMode, ScreenShape};
    use chrono::{FixedOffset, TimeZone, Utc};
    use embedded_graphics::mock_display::MockDisplay;

    fn reading() -> ClockReading {
        let utc = Utc.with_ymd_and_hms(2026, 8, 7, 10, 8, 7).unwrap();
        ClockReading::derive(utc, FixedOffset::east_opt(0).unwrap())
    }

    fn weather() -> WeatherSnapshot {
        WeatherSnapshot {
            condition: WeatherKind::Clear,
            high_temp: 75,
            low_temp: 60,
        }
    }

    fn permissive_display() -> MockDisplay<Rgb565> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);
        display
    }

    #[test]
    fn eg_surface_renders_a_full_frame() {
        let geometry = DisplayGeometry::new(64, 64, ScreenShape::Rectangular).unwrap();
        let mut surface = EgSurface::new(permissive_display());
        let plan = LayoutEngine::default().compute(
            geometry,
            DisplayMode::default(),
            &reading(),
            &weather(),
            &surface,
            &BuiltinIcons::new(),
        );

        execute_plan(&plan, &mut surface).unwrap();

        // Something must have been drawn to the panel
        let display = surface.into_inner();
        assert!(display.affected_area().size.width > 0);
    }

    #[test]
    fn eg_surface_renders_every_icon() {
        for kind in WeatherKind::ALL {
            let mut surface = EgSurface::new(permissive_display());

            surface.draw_icon(kind, 4.0, 4.0).unwrap();

            let display = surface.into_inner();
            assert!(
                display.affected_area().size.width > 0,
                "icon {} drew nothing",
                kind
            );
        }
    }

    #[test]
    fn eg_metrics_are_fixed_advance() {
        let display = MockDisplay::<Rgb565>::new();
        let surface = EgSurface::new(display);
        let style = TextStyle {
            role: FontRole::HoursMinutes,
            color: Color::WHITE,
            anti_alias: true,
        };
        // FONT_10X20: five glyphs, ten pixels each
        assert_eq!(surface.text_width("10:08", &style), 50.0);
        assert_eq!(surface.text_width("", &style), 0.0);
    }

    #[test]
    fn term_surface_shows_time_date_and_temps() {
        let geometry = DisplayGeometry::new(320, 320, ScreenShape::Round).unwrap();
        let mut surface = TermSurface::new(geometry);
        let plan = LayoutEngine::default().compute(
            geometry,
            DisplayMode::default(),
            &reading(),
            &weather(),
            &surface,
            &BuiltinIcons::new(),
        );

        execute_plan(&plan, &mut surface).unwrap();

        assert!(surface.contains("10:08"));
        assert!(surface.contains("07"));
        assert!(surface.contains("Fri, Aug 7, 2026"));
        assert!(surface.contains("75°"));
        assert!(surface.contains("60°"));
        assert!(surface.contains("[O]"));
        assert!(surface.contains("---"));
    }

    #[test]
    fn term_surface_ambient_frame_is_sparse() {
        let geometry = DisplayGeometry::new(320, 320, ScreenShape::Round).unwrap();
        let mut surface = TermSurface::new(geometry);
        let mode = DisplayMode {
            ambient: true,
            low_bit_ambient: false,
        };
        let plan = LayoutEngine::default().compute(
            geometry,
            mode,
            &reading(),
            &weather(),
            &surface,
            &BuiltinIcons::new(),
        );

        execute_plan(&plan, &mut surface).unwrap();

        assert!(surface.contains("10:08"));
        assert!(!surface.contains("75°"));
        assert!(!surface.contains("[O]"));
        assert!(!surface.contains("---"));
    }

    #[test]
    fn term_surface_centers_the_clock() {
        let geometry = DisplayGeometry::new(320, 320, ScreenShape::Round).unwrap();
        let mut surface = TermSurface::new(geometry);
        let plan = LayoutEngine::default().compute(
            geometry,
            DisplayMode::default(),
            &reading(),
            &weather(),
            &surface,
            &BuiltinIcons::new(),
        );
        execute_plan(&plan, &mut surface).unwrap();

        let grid = surface.to_grid_string();
        let line = grid.lines().find(|l| l.contains("10:08")).unwrap();
        let start = line.find("10:08").unwrap();
        let center = start as f32 + 2.5; // middle of five glyphs
        // "10:08 07" sits slightly left of center because the seconds hang
        // off the right edge of the centered time text
        assert!((center - 24.0).abs() <= 2.0, "clock at column {}", start);
    }
}
