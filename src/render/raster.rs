use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use tracing::trace;

use super::{RenderCommand, RenderContext, RenderList, build_render_list};
use crate::canvas::Canvas;
use crate::config::{PlotConfig, RenderConfig};
use crate::error::{PlotError, Result};
use crate::geom::ScreenRect;
use crate::layer::{LayerSnapshot, fit_layers};
use crate::scene::SceneSnapshot;
use crate::transform::Transform;
use crate::view::Viewport;

/// A rendered frame: the command list and the rasterized pixels.
///
/// Frames are immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct Frame {
    sequence: u64,
    width: u32,
    height: u32,
    viewport: Viewport,
    primitives: usize,
    render: Arc<RenderList>,
    pixels: Arc<Vec<u8>>,
}

impl Frame {
    /// Position of the frame in the renderer's output, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Frame size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Data bounds shown by the frame.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of scene primitives the frame was built from.
    pub fn primitive_count(&self) -> usize {
        self.primitives
    }

    /// Commands the frame was rasterized from.
    pub fn render_list(&self) -> &RenderList {
        &self.render
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
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    /// Copy the pixels into an owned image.
    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.to_vec()).ok_or_else(|| {
            PlotError::Surface(format!(
                "frame buffer does not match {}x{}",
                self.width, self.height
            ))
        })
    }

    /// Write the frame as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = self.to_image()?;
        let mut writer = BufWriter::new(File::create(path)?);
        image.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush()?;
        Ok(())
    }
}

/// Turns snapshots into frames on an owned canvas.
#[derive(Debug)]
pub struct Renderer {
    canvas: Canvas,
    settings: RenderConfig,
    sequence: u64,
}

impl Renderer {
    /// Create a renderer with a canvas sized for `config`.
    pub fn new(config: PlotConfig, settings: RenderConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            canvas: Canvas::new(config)?,
            settings,
            sequence: 0,
        })
    }

    /// Apply a new plot config. The canvas is left unchanged on error.
    pub fn reset(&mut self, config: PlotConfig) -> Result<()> {
        self.canvas.reset(config)
    }

    /// Resize the canvas, keeping the bounds.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas.resize(width, height)
    }

    /// Active plot config.
    pub fn config(&self) -> &PlotConfig {
        self.canvas.config()
    }

    /// Renderer settings.
    pub fn settings(&self) -> &RenderConfig {
        &self.settings
    }

    /// Canvas holding the last rasterized frame.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.sequence
    }

    /// Transform used for a frame showing `layers`.
    ///
    /// Unless the config fixes the plot area, attached layers choose the
    /// visible bounds.
    pub fn frame_transform(&self, layers: &[LayerSnapshot]) -> Transform {
        let base = *self.canvas.transform();
        if self.canvas.config().fixed_plot_area {
            return base;
        }
        fit_layers(layers)
            .and_then(|viewport| Transform::new(viewport, base.screen()))
            .unwrap_or(base)
    }

    /// Render one frame from stable snapshots.
    pub fn render(&mut self, scene: &SceneSnapshot, layers: &[LayerSnapshot]) -> Frame {
        let transform = self.frame_transform(layers);
        let list = build_render_list(
            RenderContext {
                transform: &transform,
                config: self.canvas.config(),
                render: &self.settings,
            },
            scene,
            layers,
        );
        rasterize(&list, &mut self.canvas, &self.settings);
        self.sequence += 1;
        trace!(
            sequence = self.sequence,
            primitives = scene.len(),
            commands = list.len(),
            "frame rendered"
        );
        Frame {
            sequence: self.sequence,
            width: self.canvas.width(),
            height: self.canvas.height(),
            viewport: transform.viewport(),
            primitives: scene.len(),
            render: Arc::new(list),
            pixels: Arc::new(self.canvas.pixels().to_vec()),
        }
    }
}

/// Rasterize a command list onto a canvas, starting from the background.
///
/// Text commands are skipped; the canvas has no font system.
pub fn rasterize(list: &RenderList, canvas: &mut Canvas, settings: &RenderConfig) {
    canvas.set_clip(None);
    canvas.fill(settings.background);
    let mut clip_stack: Vec<ScreenRect> = Vec::new();
    for command in list.commands() {
        match command {
            RenderCommand::ClipRect(rect) => {
                let clip = match clip_stack.last() {
                    Some(outer) => outer.intersect(*rect).unwrap_or(ScreenRect::new(rect.min, rect.min)),
                    None => *rect,
                };
                clip_stack.push(clip);
                canvas.set_clip(Some(clip));
            }
            RenderCommand::ClipEnd => {
                clip_stack.pop();
                canvas.set_clip(clip_stack.last().copied());
            }
            RenderCommand::LineSegments {
                segments,
                color,
                width,
            } => {
                for segment in segments {
                    canvas.draw_line(segment.start, segment.end, *color, *width);
                }
            }
            RenderCommand::Points {
                points,
                size,
                color,
            } => {
                for point in points {
                    canvas.draw_marker(*point, *size, *color);
                }
            }
            RenderCommand::Rect { rect, fill, stroke } => {
                if let Some(fill) = fill {
                    canvas.fill_rect(*rect, *fill);
                }
                if let Some(stroke) = stroke {
                    canvas.stroke_rect(*rect, *stroke, 1.0);
                }
            }
            RenderCommand::Text { .. } => {}
        }
    }
    canvas.set_clip(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::heightmap::HeightMap;
    use crate::histogram::Histogram;
    use crate::layer::Layer;
    use crate::scene::Scene;
    use crate::view::Range;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn small_config() -> PlotConfig {
        PlotConfig {
            area: 100 * 100,
            margin_x: 10,
            margin_y: 10,
            ..PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0)
        }
    }

    fn renderer() -> Renderer {
        let settings = RenderConfig {
            show_axes: false,
            ..RenderConfig::default()
        };
        Renderer::new(small_config(), settings).unwrap()
    }

    #[test]
    fn point_lands_at_mapped_pixel() {
        let mut renderer = renderer();
        let mut scene = Scene::new(small_config().viewport());
        scene.add_point(0.5, 0.5, Some(Color::RED));
        let frame = renderer.render(&scene.snapshot(), &[]);

        // Plot area spans x 10..110 and y 20..120.
        assert_eq!(frame.pixel(60, 70), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(5, 5), Some([255, 255, 255, 255]));
        assert_eq!(frame.sequence(), 1);
        assert_eq!(frame.primitive_count(), 1);
    }

    #[test]
    fn lines_are_clipped_to_plot_area() {
        let mut renderer = renderer();
        let mut scene = Scene::new(Viewport::new(Range::new(-10.0, 10.0), Range::new(0.0, 1.0)));
        scene.add_line(1, -10.0, 0.5, Some(Color::BLUE), 1);
        scene.add_line(1, 10.0, 0.5, None, 1);
        let frame = renderer.render(&scene.snapshot(), &[]);
        assert_eq!(frame.pixel(2, 70), Some([255, 255, 255, 255]));
        assert_eq!(frame.pixel(60, 70), Some([0, 0, 255, 255]));
    }

    #[test]
    fn layers_choose_bounds_unless_fixed() {
        let mut renderer = renderer();
        let map = HeightMap::new(0.0, 4.0, 0.0, 2.0).unwrap();
        let layers = [Layer::from(map).snapshot()];
        let scene = Scene::new(small_config().viewport()).snapshot();

        let frame = renderer.render(&scene, &layers);
        assert_eq!(frame.viewport().x, Range::new(0.0, 4.0));

        renderer
            .reset(PlotConfig {
                fixed_plot_area: true,
                ..small_config()
            })
            .unwrap();
        let frame = renderer.render(&scene, &layers);
        assert_eq!(frame.viewport().x, Range::new(0.0, 1.0));
    }

    #[test]
    fn empty_histogram_keeps_config_bounds() {
        let renderer = renderer();
        let layers = [Layer::from(Histogram::new()).snapshot()];
        let transform = renderer.frame_transform(&layers);
        assert_eq!(transform.viewport(), small_config().viewport());
    }

    #[test]
    fn frame_converts_to_image() {
        let mut renderer = renderer();
        let scene = Scene::new(small_config().viewport()).snapshot();
        let frame = renderer.render(&scene, &[]);
        let image = frame.to_image().unwrap();
        assert_eq!(image.dimensions(), (130, 130));
    }

    #[test]
    fn far_off_outlines_render_promptly() {
        let config = PlotConfig {
            fixed_plot_area: true,
            ..small_config()
        };
        let histogram = Histogram::new();
        histogram.set_data([0.0, 1e12]).unwrap();
        let layers = [Layer::from(histogram).snapshot()];
        let scene = Scene::new(config.viewport()).snapshot();

        let (done, finished) = mpsc::channel();
        thread::spawn(move || {
            let mut renderer = renderer();
            renderer.reset(config).unwrap();
            // The first bin spans half a trillion units to the right.
            let frame = renderer.render(&scene, &layers);
            let _ = done.send(frame.pixel(60, 20));
        });
        let top_edge = finished.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(top_edge, Some([0, 0, 0, 255]));
    }
}
