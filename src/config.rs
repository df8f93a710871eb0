//! Plot and renderer configuration values.

use std::time::Duration;

use crate::color::Color;
use crate::error::{PlotError, Result};
use crate::geom::{ScreenPoint, ScreenRect};
use crate::view::{Range, Viewport};

/// Padding in pixels on the top and right edges of the canvas.
const EDGE_MARGIN: u32 = 20;

/// Largest canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Most tick marks drawn per axis.
pub const MAX_TICKS: u32 = 1_000;

/// Finest grid used to draw height maps and surface plots.
pub const MAX_GRID_RESOLUTION: usize = 1_024;

/// Bounds and layout of a plot.
///
/// Applying a config to a plot clears its scene and rebuilds the coordinate
/// mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Minimum visible X value.
    pub min_x: f64,
    /// Maximum visible X value.
    pub max_x: f64,
    /// Minimum visible Y value.
    pub min_y: f64,
    /// Maximum visible Y value.
    pub max_y: f64,
    /// Plot area in pixels (width times height).
    pub area: u32,
    /// Ratio of plot area width to height.
    pub aspect_ratio: f64,
    /// Space below the plot area reserved for the X axis, in pixels.
    pub margin_x: u32,
    /// Space left of the plot area reserved for the Y axis, in pixels.
    pub margin_y: u32,
    /// Number of tick marks per axis.
    pub nr_of_ticks: u32,
    /// Tick mark length in pixels.
    pub ticks_length: u32,
    /// Point marker size in pixels.
    pub point_size: u32,
    /// Disable automatic bounds changes by aggregations.
    pub fixed_plot_area: bool,
    /// Window title.
    pub title: String,
    /// X axis label.
    pub xlabel: String,
    /// Y axis label.
    pub ylabel: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 0.0,
            max_y: 50.0,
            area: 500 * 500,
            aspect_ratio: 1.0,
            margin_x: 60,
            margin_y: 60,
            nr_of_ticks: 10,
            ticks_length: 7,
            point_size: 4,
            fixed_plot_area: false,
            title: "RealTimePlot".to_string(),
            xlabel: "x".to_string(),
            ylabel: "y".to_string(),
        }
    }
}

impl PlotConfig {
    /// Create a default config with the given bounds.
    pub fn with_bounds(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            ..Self::default()
        }
    }

    /// Visible data bounds.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            Range::new(self.min_x, self.max_x),
            Range::new(self.min_y, self.max_y),
        )
    }

    /// Replace the visible bounds, keeping the layout.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.min_x = viewport.x.min;
        self.max_x = viewport.x.max;
        self.min_y = viewport.y.min;
        self.max_y = viewport.y.max;
    }

    /// Plot area size in pixels derived from `area` and `aspect_ratio`.
    pub fn plot_area_size(&self) -> (u32, u32) {
        let area = self.area as f64;
        let width = (area * self.aspect_ratio).sqrt().round().max(1.0);
        let height = (area / width).round().max(1.0);
        (width as u32, height as u32)
    }

    /// Full canvas size in pixels, including margins.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (width, height) = self.plot_area_size();
        (
            width.saturating_add(self.margin_y).saturating_add(EDGE_MARGIN),
            height.saturating_add(self.margin_x).saturating_add(EDGE_MARGIN),
        )
    }

    /// Pixel rectangle of the plot area within a canvas of the given size.
    ///
    /// Margins are kept at their configured size; the plot area absorbs any
    /// difference between the configured and the actual canvas size.
    pub fn plot_rect(&self, canvas: (u32, u32)) -> ScreenRect {
        let left = self.margin_y as f32;
        let top = EDGE_MARGIN as f32;
        let right = canvas.0.saturating_sub(EDGE_MARGIN) as f32;
        let bottom = canvas.1.saturating_sub(self.margin_x) as f32;
        ScreenRect::new(ScreenPoint::new(left, top), ScreenPoint::new(right, bottom))
    }

    /// Check that the config describes a drawable plot.
    pub fn validate(&self) -> Result<()> {
        if !self.viewport().is_valid() || self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(PlotError::InvalidConfig(format!(
                "bounds must be finite with min < max, got x [{}, {}] y [{}, {}]",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        if self.area == 0 {
            return Err(PlotError::InvalidConfig("area must be positive".to_string()));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(PlotError::InvalidConfig(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        let (width, height) = self.plot_area_size();
        let canvas_width = u64::from(width) + u64::from(self.margin_y) + u64::from(EDGE_MARGIN);
        let canvas_height = u64::from(height) + u64::from(self.margin_x) + u64::from(EDGE_MARGIN);
        if canvas_width > u64::from(MAX_CANVAS_SIDE) || canvas_height > u64::from(MAX_CANVAS_SIDE) {
            return Err(PlotError::InvalidConfig(format!(
                "canvas {canvas_width}x{canvas_height} exceeds {MAX_CANVAS_SIDE} pixels per side"
            )));
        }
        if self.nr_of_ticks > MAX_TICKS {
            return Err(PlotError::InvalidConfig(format!(
                "at most {MAX_TICKS} ticks per axis, got {}",
                self.nr_of_ticks
            )));
        }
        Ok(())
    }
}

/// Check an explicit canvas size against [`MAX_CANVAS_SIDE`].
pub(crate) fn check_canvas_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(PlotError::InvalidConfig(format!(
            "canvas {width}x{height} must be between 1 and {MAX_CANVAS_SIDE} pixels per side"
        )));
    }
    Ok(())
}

/// Renderer and redraw loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Maximum delay between two redraws.
    pub tick: Duration,
    /// Canvas background color.
    pub background: Color,
    /// Default color for primitives without an explicit color.
    pub foreground: Color,
    /// Draw the axes box and tick marks.
    pub show_axes: bool,
    /// Grid resolution used when drawing height maps.
    pub heightmap_resolution: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(33),
            background: Color::WHITE,
            foreground: Color::BLACK,
            show_axes: true,
            heightmap_resolution: 50,
        }
    }
}

impl RenderConfig {
    /// Check that the redraw loop and height-map grid are usable.
    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(PlotError::InvalidConfig("tick must be positive".to_string()));
        }
        if !(1..=MAX_GRID_RESOLUTION).contains(&self.heightmap_resolution) {
            return Err(PlotError::InvalidConfig(format!(
                "height-map resolution must be in 1..={MAX_GRID_RESOLUTION}, got {}",
                self.heightmap_resolution
            )));
        }
        Ok(())
    }
}
