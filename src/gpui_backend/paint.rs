use gpui::{
    App, BorderStyle, Bounds, ContentMask, Corners, Edges, PathBuilder, Pixels, TextRun, Window,
    font, point, px, quad,
};

use crate::color::Color;
use crate::geom::{ScreenPoint, ScreenRect};
use crate::render::{RenderCommand, RenderList, ScreenSegment, TextStyle};

/// Paint a render list with its pixel origin at `origin`.
pub(crate) fn paint_list(
    list: &RenderList,
    origin: ScreenPoint,
    window: &mut Window,
    cx: &mut App,
) {
    let mut clip_stack: Vec<ContentMask<Pixels>> = Vec::new();
    for command in list.commands() {
        match command {
            RenderCommand::ClipRect(rect) => {
                clip_stack.push(ContentMask {
                    bounds: to_bounds(*rect, origin),
                });
            }
            RenderCommand::ClipEnd => {
                clip_stack.pop();
            }
            RenderCommand::LineSegments {
                segments,
                color,
                width,
            } => {
                with_clip(window, &clip_stack, |window| {
                    paint_lines(window, origin, segments, *color, *width);
                });
            }
            RenderCommand::Points {
                points,
                size,
                color,
            } => {
                with_clip(window, &clip_stack, |window| {
                    paint_points(window, origin, points, *size, *color);
                });
            }
            RenderCommand::Rect { rect, fill, stroke } => {
                with_clip(window, &clip_stack, |window| {
                    paint_rect(window, to_bounds(*rect, origin), *fill, *stroke);
                });
            }
            RenderCommand::Text {
                position,
                text,
                style,
            } => {
                with_clip(window, &clip_stack, |window| {
                    paint_text(window, cx, offset(*position, origin), text, style);
                });
            }
        }
    }
}

fn paint_lines(
    window: &mut Window,
    origin: ScreenPoint,
    segments: &[ScreenSegment],
    color: Color,
    width: f32,
) {
    if segments.is_empty() {
        return;
    }
    let mut builder = PathBuilder::stroke(px(width.max(0.5)));
    for segment in segments {
        let start = offset(segment.start, origin);
        let end = offset(segment.end, origin);
        builder.move_to(point(px(start.x), px(start.y)));
        builder.line_to(point(px(end.x), px(end.y)));
    }
    if let Ok(path) = builder.build() {
        window.paint_path(path, to_rgba(color));
    }
}

fn paint_points(
    window: &mut Window,
    origin: ScreenPoint,
    points: &[ScreenPoint],
    size: f32,
    color: Color,
) {
    let half = size.max(1.0) * 0.5;
    for pt in points {
        let pt = offset(*pt, origin);
        let bounds = Bounds::from_corners(
            point(px(pt.x - half), px(pt.y - half)),
            point(px(pt.x + half), px(pt.y + half)),
        );
        window.paint_quad(quad(
            bounds,
            Corners::all(px(0.0)),
            to_rgba(color),
            Edges::all(px(0.0)),
            to_rgba(color),
            BorderStyle::default(),
        ));
    }
}

fn paint_rect(
    window: &mut Window,
    bounds: Bounds<Pixels>,
    fill: Option<Color>,
    stroke: Option<Color>,
) {
    let (border, border_width) = match stroke {
        Some(color) => (color, 1.0),
        None => (Color::TRANSPARENT, 0.0),
    };
    window.paint_quad(quad(
        bounds,
        Corners::all(px(0.0)),
        to_rgba(fill.unwrap_or(Color::TRANSPARENT)),
        Edges::all(px(border_width)),
        to_rgba(border),
        BorderStyle::default(),
    ));
}

fn paint_text(
    window: &mut Window,
    cx: &mut App,
    position: ScreenPoint,
    text: &str,
    style: &TextStyle,
) {
    if text.is_empty() {
        return;
    }
    let font_size = px(style.size);
    let run = TextRun {
        len: text.len(),
        font: font(".SystemUIFont"),
        color: to_hsla(style.color),
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    let shaped = window
        .text_system()
        .shape_line(text.to_string().into(), font_size, &[run], None);
    let line_height = shaped.ascent + shaped.descent;
    let origin = point(px(position.x), px(position.y));
    let _ = shaped.paint(origin, line_height, window, cx);
}

fn offset(point: ScreenPoint, origin: ScreenPoint) -> ScreenPoint {
    ScreenPoint::new(point.x + origin.x, point.y + origin.y)
}

fn to_rgba(color: Color) -> gpui::Rgba {
    gpui::Rgba {
        r: color.r() as f32,
        g: color.g() as f32,
        b: color.b() as f32,
        a: color.a() as f32,
    }
}

pub(crate) fn to_hsla(color: Color) -> gpui::Hsla {
    gpui::Hsla::from(to_rgba(color))
}

fn to_bounds(rect: ScreenRect, origin: ScreenPoint) -> Bounds<Pixels> {
    let min = offset(rect.min, origin);
    let max = offset(rect.max, origin);
    Bounds::from_corners(point(px(min.x), px(min.y)), point(px(max.x), px(max.y)))
}

fn with_clip(window: &mut Window, stack: &[ContentMask<Pixels>], f: impl FnOnce(&mut Window)) {
    if let Some(mask) = stack.last() {
        window.with_content_mask(Some(mask.clone()), f);
    } else {
        f(window);
    }
}
