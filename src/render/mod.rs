//! Rendering primitives and clipping helpers.
//!
//! Snapshots of the scene and of attached layers are turned into a backend
//! agnostic [`RenderList`]. The [`Renderer`] rasterizes that list onto a
//! [`Canvas`](crate::canvas::Canvas); other backends (such as the gpui view)
//! paint the same list with their own primitives.

mod raster;

pub use raster::{Frame, Renderer, rasterize};

use crate::color::{Color, ColorMap};
use crate::config::{MAX_GRID_RESOLUTION, PlotConfig, RenderConfig};
use crate::geom::{Point, ScreenPoint, ScreenRect};
use crate::heightmap::HeightMapSnapshot;
use crate::histogram::HistogramSnapshot;
use crate::layer::LayerSnapshot;
use crate::scene::{Primitive, SceneSnapshot};
use crate::surface::{SurfaceSnapshot, cell_index};
use crate::transform::Transform;

/// Text styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Text color.
    pub color: Color,
    /// Font size in pixels.
    pub size: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 12.0,
        }
    }
}

/// A line segment in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSegment {
    /// Segment start.
    pub start: ScreenPoint,
    /// Segment end.
    pub end: ScreenPoint,
}

impl ScreenSegment {
    /// Create a new line segment.
    pub fn new(start: ScreenPoint, end: ScreenPoint) -> Self {
        Self { start, end }
    }
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Start clipping to a rectangle.
    ClipRect(ScreenRect),
    /// End clipping.
    ClipEnd,
    /// Draw line segments.
    LineSegments {
        /// Segments to draw.
        segments: Vec<ScreenSegment>,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f32,
    },
    /// Draw square point markers.
    Points {
        /// Marker centers.
        points: Vec<ScreenPoint>,
        /// Marker size in pixels.
        size: f32,
        /// Marker color.
        color: Color,
    },
    /// Draw a rectangle.
    Rect {
        /// Rectangle bounds.
        rect: ScreenRect,
        /// Fill color, if filled.
        fill: Option<Color>,
        /// Outline color, if outlined.
        stroke: Option<Color>,
    },
    /// Draw text. Only backends with a font system paint text.
    Text {
        /// Top-left corner of the text.
        position: ScreenPoint,
        /// Text content.
        text: String,
        /// Text styling.
        style: TextStyle,
    },
}

/// Aggregated render commands.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderList {
    commands: Vec<RenderCommand>,
}

impl RenderList {
    /// Create an empty render list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a render command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Access all render commands.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Everything needed to turn snapshots into commands.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Data-to-pixel mapping of the frame.
    pub transform: &'a Transform,
    /// Layout settings.
    pub config: &'a PlotConfig,
    /// Colors and grid resolution.
    pub render: &'a RenderConfig,
}

/// Build the full command list for one frame.
///
/// Layers are drawn first, the scene on top in insertion order, then the
/// axes box with its ticks and labels outside the clip.
pub fn build_render_list(
    ctx: RenderContext<'_>,
    scene: &SceneSnapshot,
    layers: &[LayerSnapshot],
) -> RenderList {
    let clip = ctx.transform.screen();
    let mut list = RenderList::new();
    list.push(RenderCommand::ClipRect(clip));
    for layer in layers {
        match layer {
            LayerSnapshot::Histogram(histogram) => push_histogram(&mut list, ctx, histogram),
            LayerSnapshot::HeightMap(map) => push_height_map(&mut list, ctx, map),
            LayerSnapshot::Surface(surface) => push_surface(&mut list, ctx, surface),
        }
    }
    push_scene(&mut list, ctx, scene);
    list.push(RenderCommand::ClipEnd);
    if ctx.render.show_axes {
        push_axes(&mut list, ctx);
    }
    list
}

fn push_scene(list: &mut RenderList, ctx: RenderContext<'_>, scene: &SceneSnapshot) {
    let clip = ctx.transform.screen();
    let size = ctx.config.point_size as f32;
    // Consecutive markers of one color share a command.
    let mut markers: Option<(Color, Vec<ScreenPoint>)> = None;

    for primitive in scene.primitives() {
        match primitive {
            Primitive::Point { position, color } => {
                let color = color.unwrap_or(ctx.render.foreground);
                if markers.as_ref().is_some_and(|(current, _)| *current != color) {
                    flush_markers(list, &mut markers, size);
                }
                let (_, points) = markers.get_or_insert_with(|| (color, Vec::new()));
                if let Some(screen) = ctx.transform.data_to_screen(*position) {
                    points.push(screen);
                }
            }
            Primitive::Line(line) => {
                flush_markers(list, &mut markers, size);
                let mut segments = Vec::new();
                build_line_segments(&line.points, ctx.transform, clip, &mut segments);
                if !segments.is_empty() {
                    list.push(RenderCommand::LineSegments {
                        segments,
                        color: line.color.unwrap_or(ctx.render.foreground),
                        width: line.width as f32,
                    });
                }
            }
            Primitive::Rectangle(rect) => {
                flush_markers(list, &mut markers, size);
                let Some(screen) = ctx.transform.rect_to_screen(rect.min, rect.max) else {
                    continue;
                };
                let color = rect.color.unwrap_or(ctx.render.foreground);
                let (fill, stroke) = if rect.fill {
                    (Some(color), None)
                } else {
                    (None, Some(color))
                };
                list.push(RenderCommand::Rect {
                    rect: screen,
                    fill,
                    stroke,
                });
            }
            Primitive::Label {
                position,
                text,
                color,
            } => {
                flush_markers(list, &mut markers, size);
                let Some(screen) = ctx.transform.data_to_screen(*position) else {
                    continue;
                };
                list.push(RenderCommand::Text {
                    position: screen,
                    text: text.clone(),
                    style: TextStyle {
                        color: color.unwrap_or(ctx.render.foreground),
                        ..TextStyle::default()
                    },
                });
            }
        }
    }
    flush_markers(list, &mut markers, size);
}

fn flush_markers(list: &mut RenderList, markers: &mut Option<(Color, Vec<ScreenPoint>)>, size: f32) {
    if let Some((color, points)) = markers.take() {
        if !points.is_empty() {
            list.push(RenderCommand::Points {
                points,
                size,
                color,
            });
        }
    }
}

fn push_histogram(list: &mut RenderList, ctx: RenderContext<'_>, histogram: &HistogramSnapshot) {
    for bin in histogram.bins() {
        if bin.count == 0 {
            continue;
        }
        let corner = Point::new(bin.start, 0.0);
        let opposite = Point::new(bin.end, histogram.height(bin));
        if let Some(rect) = ctx.transform.rect_to_screen(corner, opposite) {
            list.push(RenderCommand::Rect {
                rect,
                fill: None,
                stroke: Some(ctx.render.foreground),
            });
        }
    }
}

fn push_height_map(list: &mut RenderList, ctx: RenderContext<'_>, map: &HeightMapSnapshot) {
    let samples = map.visible_samples();
    let Some(scaling) = map.color_scaling() else {
        return;
    };
    let resolution = ctx.render.heightmap_resolution.clamp(1, MAX_GRID_RESOLUTION);
    let bounds = map.bounds();
    let mut sums = vec![(0.0_f64, 0_usize); resolution * resolution];
    for sample in samples {
        let column = cell_index(bounds.x, resolution, sample.x);
        let row = cell_index(bounds.y, resolution, sample.y);
        let cell = &mut sums[row * resolution + column];
        cell.0 += sample.z;
        cell.1 += 1;
    }

    let colormap = ColorMap::heat();
    let width = bounds.x.span() / resolution as f64;
    let height = bounds.y.span() / resolution as f64;
    for (index, &(sum, count)) in sums.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let column = index % resolution;
        let row = index / resolution;
        let corner = Point::new(
            bounds.x.min + width * column as f64,
            bounds.y.min + height * row as f64,
        );
        let opposite = Point::new(corner.x + width, corner.y + height);
        if let Some(rect) = ctx.transform.rect_to_screen(corner, opposite) {
            let mean = sum / count as f64;
            list.push(RenderCommand::Rect {
                rect,
                fill: Some(colormap.map(scaling.fraction(mean))),
                stroke: None,
            });
        }
    }
}

fn push_surface(list: &mut RenderList, ctx: RenderContext<'_>, surface: &SurfaceSnapshot) {
    let max = surface.max_count();
    if max == 0 {
        return;
    }
    let colormap = ColorMap::greyscale();
    for row in 0..surface.resolution() {
        for column in 0..surface.resolution() {
            let count = surface.count(column, row);
            if count == 0 {
                continue;
            }
            let cell = surface.cell_bounds(column, row);
            let corner = Point::new(cell.x.min, cell.y.min);
            let opposite = Point::new(cell.x.max, cell.y.max);
            if let Some(rect) = ctx.transform.rect_to_screen(corner, opposite) {
                list.push(RenderCommand::Rect {
                    rect,
                    fill: Some(colormap.map(count as f64 / max as f64)),
                    stroke: None,
                });
            }
        }
    }
}

fn push_axes(list: &mut RenderList, ctx: RenderContext<'_>) {
    let rect = ctx.transform.screen();
    let viewport = ctx.transform.viewport();
    let color = ctx.render.foreground;
    list.push(RenderCommand::Rect {
        rect,
        fill: None,
        stroke: Some(color),
    });

    let ticks = ctx.config.nr_of_ticks;
    let length = ctx.config.ticks_length as f32;
    let label = TextStyle {
        color,
        ..TextStyle::default()
    };
    let mut segments = Vec::with_capacity(2 * (ticks as usize + 1));
    if ticks > 0 {
        let x_step = viewport.x.span() / ticks as f64;
        let y_step = viewport.y.span() / ticks as f64;
        for i in 0..=ticks {
            let t = i as f32 / ticks as f32;
            let x = rect.min.x + rect.width() * t;
            let y = rect.max.y - rect.height() * t;
            segments.push(ScreenSegment::new(
                ScreenPoint::new(x, rect.max.y),
                ScreenPoint::new(x, rect.max.y + length),
            ));
            segments.push(ScreenSegment::new(
                ScreenPoint::new(rect.min.x - length, y),
                ScreenPoint::new(rect.min.x, y),
            ));
            list.push(RenderCommand::Text {
                position: ScreenPoint::new(x - 8.0, rect.max.y + length + 2.0),
                text: format_tick(viewport.x.min + x_step * i as f64, x_step),
                style: label.clone(),
            });
            list.push(RenderCommand::Text {
                position: ScreenPoint::new(rect.min.x - length - 40.0, y - 6.0),
                text: format_tick(viewport.y.min + y_step * i as f64, y_step),
                style: label.clone(),
            });
        }
    }
    list.push(RenderCommand::LineSegments {
        segments,
        color,
        width: 1.0,
    });

    let captions = [
        (
            ScreenPoint::new(rect.min.x, 2.0),
            &ctx.config.title,
        ),
        (
            ScreenPoint::new(rect.max.x - 40.0, rect.max.y + length + 20.0),
            &ctx.config.xlabel,
        ),
        (ScreenPoint::new(4.0, rect.min.y), &ctx.config.ylabel),
    ];
    for (position, text) in captions {
        if !text.is_empty() {
            list.push(RenderCommand::Text {
                position,
                text: text.clone(),
                style: label.clone(),
            });
        }
    }
}

/// Format a tick value with just enough decimals for the tick spacing.
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).clamp(0.0, 6.0) as usize
    } else {
        0
    };
    let text = format!("{value:.decimals$}");
    // Avoid printing "-0".
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

/// Build clipped line segments from data points.
pub fn build_line_segments(
    points: &[Point],
    transform: &Transform,
    clip: ScreenRect,
    out: &mut Vec<ScreenSegment>,
) {
    out.clear();
    if points.len() < 2 {
        return;
    }
    for window in points.windows(2) {
        let Some(start) = transform.data_to_screen(window[0]) else {
            continue;
        };
        let Some(end) = transform.data_to_screen(window[1]) else {
            continue;
        };
        if let Some((clipped_start, clipped_end)) = clip_segment(start, end, clip) {
            out.push(ScreenSegment::new(clipped_start, clipped_end));
        }
    }
}

/// Cohen-Sutherland clipping of a segment against a rectangle.
fn clip_segment(
    mut start: ScreenPoint,
    mut end: ScreenPoint,
    rect: ScreenRect,
) -> Option<(ScreenPoint, ScreenPoint)> {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const TOP: u8 = 4;
    const BOTTOM: u8 = 8;

    let mut out_start = region_code(start, rect, LEFT, RIGHT, TOP, BOTTOM);
    let mut out_end = region_code(end, rect, LEFT, RIGHT, TOP, BOTTOM);

    loop {
        if (out_start | out_end) == 0 {
            return Some((start, end));
        }
        if (out_start & out_end) != 0 {
            return None;
        }

        let out_code = if out_start != 0 { out_start } else { out_end };
        let (mut x, mut y) = (0.0_f32, 0.0_f32);

        if (out_code & TOP) != 0 {
            x = start.x + (end.x - start.x) * (rect.min.y - start.y) / (end.y - start.y);
            y = rect.min.y;
        } else if (out_code & BOTTOM) != 0 {
            x = start.x + (end.x - start.x) * (rect.max.y - start.y) / (end.y - start.y);
            y = rect.max.y;
        } else if (out_code & RIGHT) != 0 {
            y = start.y + (end.y - start.y) * (rect.max.x - start.x) / (end.x - start.x);
            x = rect.max.x;
        } else if (out_code & LEFT) != 0 {
            y = start.y + (end.y - start.y) * (rect.min.x - start.x) / (end.x - start.x);
            x = rect.min.x;
        }

        let new_point = ScreenPoint::new(x, y);
        if out_code == out_start {
            start = new_point;
            out_start = region_code(start, rect, LEFT, RIGHT, TOP, BOTTOM);
        } else {
            end = new_point;
            out_end = region_code(end, rect, LEFT, RIGHT, TOP, BOTTOM);
        }
    }
}

fn region_code(
    point: ScreenPoint,
    rect: ScreenRect,
    left: u8,
    right: u8,
    top: u8,
    bottom: u8,
) -> u8 {
    let mut code = 0;
    if point.x < rect.min.x {
        code |= left;
    } else if point.x > rect.max.x {
        code |= right;
    }
    if point.y < rect.min.y {
        code |= top;
    } else if point.y > rect.max.y {
        code |= bottom;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram;
    use crate::layer::Layer;
    use crate::scene::Scene;
    use crate::view::{Range, Viewport};

    fn unit_transform() -> Transform {
        let viewport = Viewport::new(Range::new(0.0, 1.0), Range::new(0.0, 1.0));
        let rect = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 10.0));
        Transform::new(viewport, rect).expect("valid transform")
    }

    #[test]
    fn clip_segment_inside() {
        let rect = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 10.0));
        let start = ScreenPoint::new(2.0, 2.0);
        let end = ScreenPoint::new(8.0, 8.0);
        let clipped = clip_segment(start, end, rect).expect("segment should clip");
        assert_eq!(clipped.0, start);
        assert_eq!(clipped.1, end);
    }

    #[test]
    fn clip_segment_crossing_edge() {
        let rect = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 10.0));
        let clipped = clip_segment(ScreenPoint::new(5.0, 5.0), ScreenPoint::new(15.0, 5.0), rect)
            .expect("segment should clip");
        assert_eq!(clipped.1, ScreenPoint::new(10.0, 5.0));
        assert!(clip_segment(ScreenPoint::new(11.0, 0.0), ScreenPoint::new(12.0, 9.0), rect).is_none());
    }

    #[test]
    fn build_segments_with_transform() {
        let transform = unit_transform();
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let mut out = Vec::new();
        build_line_segments(&points, &transform, transform.screen(), &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn scene_points_are_grouped_by_color() {
        let transform = unit_transform();
        let config = PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0);
        let render = RenderConfig {
            show_axes: false,
            ..RenderConfig::default()
        };
        let mut scene = Scene::new(config.viewport());
        scene.add_point(0.1, 0.1, None);
        scene.add_point(0.2, 0.2, None);
        scene.add_point(0.3, 0.3, Some(Color::RED));
        scene.add_line(1, 0.0, 0.0, None, 2);
        scene.add_line(1, 1.0, 1.0, None, 2);

        let ctx = RenderContext {
            transform: &transform,
            config: &config,
            render: &render,
        };
        let list = build_render_list(ctx, &scene.snapshot(), &[]);
        let commands = list.commands();
        assert_eq!(commands.len(), 5);
        assert!(matches!(commands[0], RenderCommand::ClipRect(_)));
        assert!(matches!(&commands[1], RenderCommand::Points { points, .. } if points.len() == 2));
        assert!(matches!(&commands[2], RenderCommand::Points { color, .. } if *color == Color::RED));
        assert!(matches!(&commands[3], RenderCommand::LineSegments { width, .. } if *width == 2.0));
        assert!(matches!(commands[4], RenderCommand::ClipEnd));
    }

    #[test]
    fn labels_become_text_commands() {
        let transform = unit_transform();
        let config = PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0);
        let render = RenderConfig {
            show_axes: false,
            ..RenderConfig::default()
        };
        let mut scene = Scene::new(config.viewport());
        scene.add_label(0.5, 0.5, "42", Some(Color::RED));
        let ctx = RenderContext {
            transform: &transform,
            config: &config,
            render: &render,
        };
        let list = build_render_list(ctx, &scene.snapshot(), &[]);
        assert!(matches!(
            &list.commands()[1],
            RenderCommand::Text { text, style, .. } if text == "42" && style.color == Color::RED
        ));
    }

    #[test]
    fn histogram_bars_are_outlined() {
        let transform = unit_transform();
        let config = PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0);
        let render = RenderConfig {
            show_axes: false,
            ..RenderConfig::default()
        };
        let histogram = Histogram::with_range(0.0, 1.0, 2).unwrap();
        histogram.set_data([0.1, 0.2]).unwrap();
        let ctx = RenderContext {
            transform: &transform,
            config: &config,
            render: &render,
        };
        let layers = [Layer::from(histogram).snapshot()];
        let list = build_render_list(ctx, &Scene::new(config.viewport()).snapshot(), &layers);
        let rects: Vec<_> = list
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::Rect { fill: None, stroke: Some(_), .. }))
            .collect();
        assert_eq!(rects.len(), 1);
    }

    #[test]
    fn axes_have_ticks_on_both_edges() {
        let transform = unit_transform();
        let config = PlotConfig {
            nr_of_ticks: 4,
            ..PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0)
        };
        let render = RenderConfig::default();
        let ctx = RenderContext {
            transform: &transform,
            config: &config,
            render: &render,
        };
        let list = build_render_list(ctx, &Scene::new(config.viewport()).snapshot(), &[]);
        let ticks = list.commands().iter().find_map(|c| match c {
            RenderCommand::LineSegments { segments, .. } => Some(segments.len()),
            _ => None,
        });
        assert_eq!(ticks, Some(10));
    }

    #[test]
    fn tick_labels_follow_step() {
        assert_eq!(format_tick(5.0, 5.0), "5");
        assert_eq!(format_tick(0.25, 0.05), "0.25");
        assert_eq!(format_tick(-0.0, 1.0), "0");
    }
}
