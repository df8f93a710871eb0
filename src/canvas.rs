//! Pixel surface and its data-to-pixel mapping.
//!
//! A [`Canvas`] owns an RGBA8 buffer sized from a [`PlotConfig`] and the
//! [`Transform`] that maps data coordinates into its plot area. Drawing
//! operations work in pixel space and respect an optional clip rectangle.

use crate::color::Color;
use crate::config::{PlotConfig, check_canvas_size};
use crate::error::{PlotError, Result};
use crate::geom::{ScreenPoint, ScreenRect};
use crate::transform::Transform;

/// Widest stroke the canvas will stamp, in pixels.
const MAX_STROKE: f32 = 64.0;

/// RGBA pixel buffer with an attached coordinate transform.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    config: PlotConfig,
    transform: Transform,
    clip: Option<ScreenRect>,
}

impl Canvas {
    /// Create a canvas sized for the given config.
    pub fn new(config: PlotConfig) -> Result<Self> {
        let (width, height) = config.canvas_size();
        Self::with_size(config, width, height)
    }

    /// Create a canvas with an explicit pixel size.
    pub fn with_size(config: PlotConfig, width: u32, height: u32) -> Result<Self> {
        config.validate()?;
        check_canvas_size(width, height)?;
        let transform = build_transform(&config, width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; pixel_len(width, height)],
            config,
            transform,
            clip: None,
        })
    }

    /// Apply a new config, resizing the buffer to the config's canvas size.
    pub fn reset(&mut self, config: PlotConfig) -> Result<()> {
        config.validate()?;
        let (width, height) = config.canvas_size();
        let transform = build_transform(&config, width, height)?;
        self.config = config;
        self.apply_size(width, height, transform);
        Ok(())
    }

    /// Resize the pixel buffer, keeping the current bounds.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check_canvas_size(width, height)?;
        let transform = build_transform(&self.config, width, height)?;
        self.apply_size(width, height, transform);
        Ok(())
    }

    fn apply_size(&mut self, width: u32, height: u32, transform: Transform) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(pixel_len(width, height), 0);
        self.transform = transform;
        self.clip = None;
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Active plot config.
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Active data-to-pixel transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Pixel rectangle of the plot area.
    pub fn plot_rect(&self) -> ScreenRect {
        self.transform.screen()
    }

    /// Raw RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Read a single pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    /// Restrict subsequent drawing to a rectangle.
    pub fn set_clip(&mut self, clip: Option<ScreenRect>) {
        self.clip = clip;
    }

    /// Fill the whole buffer, ignoring the clip.
    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    /// Draw a rectangle outline.
    ///
    /// Corners far outside the canvas are pulled in to just past its edges,
    /// so off-screen sides stay invisible and the edge length stays bounded.
    pub fn stroke_rect(&mut self, rect: ScreenRect, color: Color, width: f32) {
        let area = self.stroke_area(width);
        let clamp = |point: ScreenPoint| {
            ScreenPoint::new(
                point.x.clamp(area.min.x, area.max.x),
                point.y.clamp(area.min.y, area.max.y),
            )
        };
        if [rect.min.x, rect.min.y, rect.max.x, rect.max.y].iter().any(|v| v.is_nan()) {
            return;
        }
        let (min, max) = (clamp(rect.min), clamp(rect.max));
        let corners = [
            min,
            ScreenPoint::new(max.x, min.y),
            max,
            ScreenPoint::new(min.x, max.y),
        ];
        for i in 0..corners.len() {
            let next = corners[(i + 1) % corners.len()];
            self.draw_line(corners[i], next, color, width);
        }
    }

    /// Draw a straight line with the given stroke width.
    ///
    /// The segment is clipped to the canvas first; non-finite endpoints draw
    /// nothing.
    pub fn draw_line(&mut self, start: ScreenPoint, end: ScreenPoint, color: Color, width: f32) {
        if !(start.is_finite() && end.is_finite()) {
            return;
        }
        let Some((start, end)) = clip_line(start, end, self.stroke_area(width)) else {
            return;
        };
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        let half = (width.max(1.0) - 1.0) * 0.5;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = start.x + dx * t;
            let y = start.y + dy * t;
            self.stamp(x, y, half, color);
        }
    }

    /// Draw a square marker centered on a point.
    pub fn draw_marker(&mut self, center: ScreenPoint, size: f32, color: Color) {
        let half = size.max(1.0) * 0.5;
        let rect = ScreenRect::new(
            ScreenPoint::new(center.x - half, center.y - half),
            ScreenPoint::new(center.x + half, center.y + half),
        );
        self.fill_rect(rect, color);
    }

    /// Canvas bounds grown by one stroke width on every side.
    fn stroke_area(&self, width: f32) -> ScreenRect {
        let pad = width.max(1.0).min(MAX_STROKE) + 1.0;
        ScreenRect::new(
            ScreenPoint::new(-pad, -pad),
            ScreenPoint::new(self.width as f32 + pad, self.height as f32 + pad),
        )
    }

    fn stamp(&mut self, x: f32, y: f32, half: f32, color: Color) {
        let half = half.min(MAX_STROKE);
        let x0 = ((x - half).round() as i64).max(0);
        let x1 = ((x + half).round() as i64).min(self.width as i64 - 1);
        let y0 = ((y - half).round() as i64).max(0);
        let y1 = ((y + half).round() as i64).min(self.height as i64 - 1);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let (px, py) = (px as u32, py as u32);
                if self.in_clip(px, py) {
                    self.blend(px, py, color);
                }
            }
        }
    }

    fn in_clip(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        match self.clip {
            None => true,
            Some(clip) => clip.contains(ScreenPoint::new(x as f32, y as f32)),
        }
    }

    /// Integer pixel bounds `[x0, x1) x [y0, y1)` of a rectangle after clipping.
    fn pixel_span(&self, rect: ScreenRect) -> Option<(u32, u32, u32, u32)> {
        let canvas = ScreenRect::new(
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(self.width as f32, self.height as f32),
        );
        let mut bounds = rect.intersect(canvas)?;
        if let Some(clip) = self.clip {
            // Clip edges are inclusive, pixel spans are half-open.
            let clip = ScreenRect::new(clip.min, ScreenPoint::new(clip.max.x + 1.0, clip.max.y + 1.0));
            bounds = bounds.intersect(clip)?;
        }
        let x0 = bounds.min.x.round() as u32;
        let y0 = bounds.min.y.round() as u32;
        let x1 = (bounds.max.x.round() as u32).min(self.width);
        let y1 = (bounds.max.y.round() as u32).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let offset = self.offset(x, y);
        let dst = &mut self.pixels[offset..offset + 4];
        let src = color.to_rgba8();
        if src[3] == 255 {
            dst.copy_from_slice(&src);
            return;
        }
        let alpha = color.a();
        for channel in 0..3 {
            let mixed = src[channel] as f64 * alpha + dst[channel] as f64 * (1.0 - alpha);
            dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
        }
        let out_alpha = alpha + dst[3] as f64 / 255.0 * (1.0 - alpha);
        dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Liang-Barsky clip of a segment against a rectangle, in f64 so far-off
/// endpoints keep sub-pixel precision at the boundary.
fn clip_line(start: ScreenPoint, end: ScreenPoint, area: ScreenRect) -> Option<(ScreenPoint, ScreenPoint)> {
    let (x0, y0) = (start.x as f64, start.y as f64);
    let dx = end.x as f64 - x0;
    let dy = end.y as f64 - y0;
    let mut enter = 0.0_f64;
    let mut exit = 1.0_f64;
    let edges = [
        (-dx, x0 - area.min.x as f64),
        (dx, area.max.x as f64 - x0),
        (-dy, y0 - area.min.y as f64),
        (dy, area.max.y as f64 - y0),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }
    let at = |t: f64| ScreenPoint::new((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    Some((at(enter), at(exit)))
}

fn pixel_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn build_transform(config: &PlotConfig, width: u32, height: u32) -> Result<Transform> {
    Transform::new(config.viewport(), config.plot_rect((width, height))).ok_or_else(|| {
        PlotError::InvalidConfig(format!(
            "canvas {width}x{height} leaves no room for the plot area"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> PlotConfig {
        PlotConfig {
            area: 100 * 100,
            margin_x: 10,
            margin_y: 10,
            ..PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0)
        }
    }

    #[test]
    fn new_sizes_buffer_from_config() {
        let canvas = Canvas::new(small_config()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (130, 130));
        assert_eq!(canvas.pixels().len(), 130 * 130 * 4);
    }

    #[test]
    fn fill_rect_respects_clip() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.fill(Color::WHITE);
        canvas.set_clip(Some(ScreenRect::new(
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(4.0, 4.0),
        )));
        canvas.fill_rect(
            ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 10.0)),
            Color::RED,
        );
        assert_eq!(canvas.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn draw_line_covers_endpoints() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.fill(Color::WHITE);
        canvas.draw_line(
            ScreenPoint::new(20.0, 20.0),
            ScreenPoint::new(40.0, 30.0),
            Color::BLUE,
            1.0,
        );
        assert_eq!(canvas.pixel(20, 20), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(40, 30), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(40, 20), Some([255, 255, 255, 255]));
    }

    #[test]
    fn half_transparent_blend() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.fill(Color::WHITE);
        canvas.draw_marker(ScreenPoint::new(50.0, 50.0), 2.0, Color::new(0.0, 0.0, 0.0, 0.5));
        let [r, g, b, a] = canvas.pixel(50, 50).unwrap();
        assert!((126..=129).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn out_of_range_alpha_is_clamped_when_blending() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.fill(Color::WHITE);
        canvas.draw_marker(ScreenPoint::new(50.0, 50.0), 2.0, Color::new(3.0, 0.0, 0.0, -1.0));
        assert_eq!(canvas.pixel(50, 50), Some([255, 255, 255, 255]));
    }

    #[test]
    fn far_outline_is_clipped_to_canvas() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        let rect = ScreenRect::new(ScreenPoint::new(20.0, 20.0), ScreenPoint::new(1e12, f32::INFINITY));
        canvas.stroke_rect(rect, Color::RED, 1.0);
        assert_eq!(canvas.pixel(20, 100), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(120, 20), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(60, 60), Some([0, 0, 0, 0]));
    }

    #[test]
    fn non_finite_line_draws_nothing() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.draw_line(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(f32::NAN, 5.0), Color::RED, 1.0);
        assert!(canvas.pixels().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn resize_keeps_bounds() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        canvas.resize(230, 130).unwrap();
        assert_eq!(canvas.plot_rect().width(), 200.0);
        assert_eq!(canvas.transform().viewport(), small_config().viewport());
        assert!(canvas.resize(15, 15).is_err());
        assert!(canvas.resize(u32::MAX, 100).is_err());
        assert_eq!(canvas.width(), 230);
    }

    #[test]
    fn reset_rejects_invalid_config() {
        let mut canvas = Canvas::new(small_config()).unwrap();
        let err = canvas.reset(PlotConfig::with_bounds(0.0, 0.0, 0.0, 1.0));
        assert!(err.is_err());
        assert_eq!(canvas.config(), &small_config());
    }
}
