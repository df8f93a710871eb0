//! Scene model: drawable primitives in insertion order.
//!
//! Primitives are stored behind an [`Arc`] so the renderer can take an O(1)
//! snapshot. Mutations go through [`Arc::make_mut`], which only copies when a
//! snapshot is still alive; appends made during a frame therefore show up in
//! the next snapshot and never in the one being drawn.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::color::Color;
use crate::geom::Point;
use crate::view::Viewport;

/// A growing polyline identified by a caller-chosen id.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    /// Line identifier.
    pub id: i64,
    /// Vertices in append order.
    pub points: Arc<Vec<Point>>,
    /// Stroke color, `None` uses the renderer foreground.
    pub color: Option<Color>,
    /// Stroke width in pixels.
    pub width: u32,
}

/// Axis-aligned rectangle in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Corner with the smallest coordinates.
    pub min: Point,
    /// Corner with the largest coordinates.
    pub max: Point,
    /// Fill the interior instead of drawing the outline.
    pub fill: bool,
    /// Color, `None` uses the renderer foreground.
    pub color: Option<Color>,
}

/// One drawable element of a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A single marker.
    Point {
        /// Marker position.
        position: Point,
        /// Marker color.
        color: Option<Color>,
    },
    /// A line strip.
    Line(LineSegment),
    /// A rectangle.
    Rectangle(Rectangle),
    /// A text label anchored at its top-left corner.
    Label {
        /// Anchor position.
        position: Point,
        /// Label text.
        text: String,
        /// Text color.
        color: Option<Color>,
    },
}

/// Immutable view of a scene taken at a point in time.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    primitives: Arc<Vec<Primitive>>,
    generation: u64,
}

impl SceneSnapshot {
    /// Primitives in insertion order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check whether the snapshot holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Scene generation at the time of the snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Mutable scene model.
///
/// Coordinates outside the current bounds are clamped onto the bounds so a
/// burst of bad input keeps the plot responsive instead of failing.
#[derive(Debug, Clone)]
pub struct Scene {
    primitives: Arc<Vec<Primitive>>,
    lines: HashMap<i64, usize>,
    bounds: Viewport,
    generation: u64,
}

impl Scene {
    /// Create an empty scene clamping to the given bounds.
    pub fn new(bounds: Viewport) -> Self {
        Self {
            primitives: Arc::new(Vec::new()),
            lines: HashMap::new(),
            bounds,
            generation: 0,
        }
    }

    /// Current clamping bounds.
    pub fn bounds(&self) -> Viewport {
        self.bounds
    }

    /// Scene generation, bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check whether the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Take a snapshot for rendering.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            primitives: Arc::clone(&self.primitives),
            generation: self.generation,
        }
    }

    /// Add a marker. Returns `false` when the input was dropped.
    pub fn add_point(&mut self, x: f64, y: f64, color: Option<Color>) -> bool {
        let Some(position) = self.clamped(x, y) else {
            return false;
        };
        Arc::make_mut(&mut self.primitives).push(Primitive::Point { position, color });
        self.touch();
        true
    }

    /// Append a vertex to line `id`, creating the line if needed.
    ///
    /// An explicit color recolors an existing line; `width` only applies when
    /// the line is created.
    pub fn add_line(&mut self, id: i64, x: f64, y: f64, color: Option<Color>, width: u32) -> bool {
        let Some(point) = self.clamped(x, y) else {
            return false;
        };
        let primitives = Arc::make_mut(&mut self.primitives);
        match self.lines.get(&id) {
            Some(&index) => {
                if let Some(Primitive::Line(line)) = primitives.get_mut(index) {
                    Arc::make_mut(&mut line.points).push(point);
                    if color.is_some() {
                        line.color = color;
                    }
                }
            }
            None => {
                self.lines.insert(id, primitives.len());
                primitives.push(Primitive::Line(LineSegment {
                    id,
                    points: Arc::new(vec![point]),
                    color,
                    width: width.max(1),
                }));
            }
        }
        self.touch();
        true
    }

    /// Add a rectangle spanning `width_x` by `width_y` from `(min_x, min_y)`.
    pub fn add_rectangle(
        &mut self,
        min_x: f64,
        min_y: f64,
        width_x: f64,
        width_y: f64,
        fill: bool,
        color: Option<Color>,
    ) -> bool {
        let Some(a) = self.clamped(min_x, min_y) else {
            return false;
        };
        let Some(b) = self.clamped(min_x + width_x, min_y + width_y) else {
            return false;
        };
        let rect = Rectangle {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
            fill,
            color,
        };
        Arc::make_mut(&mut self.primitives).push(Primitive::Rectangle(rect));
        self.touch();
        true
    }

    /// Add a text label at a data position.
    pub fn add_label(&mut self, x: f64, y: f64, text: impl Into<String>, color: Option<Color>) -> bool {
        let Some(position) = self.clamped(x, y) else {
            return false;
        };
        let text = text.into();
        Arc::make_mut(&mut self.primitives).push(Primitive::Label {
            position,
            text,
            color,
        });
        self.touch();
        true
    }

    /// Remove all primitives, keeping the bounds.
    pub fn clear(&mut self) {
        self.primitives = Arc::new(Vec::new());
        self.lines.clear();
        self.touch();
    }

    /// Remove all primitives and switch to new bounds.
    pub fn reset(&mut self, bounds: Viewport) {
        self.bounds = bounds;
        self.clear();
    }

    /// Change the clamping bounds without touching existing primitives.
    pub fn set_bounds(&mut self, bounds: Viewport) {
        self.bounds = bounds;
        self.touch();
    }

    fn clamped(&self, x: f64, y: f64) -> Option<Point> {
        if x.is_nan() || y.is_nan() {
            warn!(x, y, "dropping primitive with NaN coordinate");
            return None;
        }
        let (x, y) = self.bounds.clamp(x, y);
        Some(Point::new(x, y))
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Range;

    fn scene() -> Scene {
        Scene::new(Viewport::new(Range::new(0.0, 10.0), Range::new(0.0, 50.0)))
    }

    #[test]
    fn lines_accumulate_instead_of_multiplying() {
        let mut scene = scene();
        scene.add_point(1.0, 1.0, None);
        scene.add_line(7, 0.0, 0.0, None, 1);
        scene.add_line(7, 1.0, 2.0, None, 1);
        scene.add_line(3, 5.0, 5.0, Some(Color::RED), 2);
        scene.add_point(2.0, 2.0, Some(Color::BLUE));
        assert_eq!(scene.len(), 4);

        let snapshot = scene.snapshot();
        let Primitive::Line(line) = &snapshot.primitives()[1] else {
            panic!("expected line");
        };
        assert_eq!(line.id, 7);
        assert_eq!(line.points.len(), 2);
    }

    #[test]
    fn out_of_bounds_coordinates_are_clamped() {
        let mut scene = scene();
        assert!(scene.add_point(-5.0, 80.0, None));
        assert!(scene.add_point(f64::INFINITY, 1.0, None));
        let snapshot = scene.snapshot();
        assert_eq!(
            snapshot.primitives()[0],
            Primitive::Point {
                position: Point::new(0.0, 50.0),
                color: None
            }
        );
        assert_eq!(
            snapshot.primitives()[1],
            Primitive::Point {
                position: Point::new(10.0, 1.0),
                color: None
            }
        );
    }

    #[test]
    fn nan_input_is_dropped() {
        let mut scene = scene();
        assert!(!scene.add_point(f64::NAN, 1.0, None));
        assert!(!scene.add_line(1, 1.0, f64::NAN, None, 1));
        assert!(scene.is_empty());
        assert_eq!(scene.generation(), 0);
    }

    #[test]
    fn snapshot_is_not_affected_by_later_appends() {
        let mut scene = scene();
        scene.add_line(1, 0.0, 0.0, None, 1);
        let before = scene.snapshot();
        scene.add_line(1, 1.0, 1.0, None, 1);
        scene.add_point(3.0, 3.0, None);

        assert_eq!(before.len(), 1);
        let Primitive::Line(line) = &before.primitives()[0] else {
            panic!("expected line");
        };
        assert_eq!(line.points.len(), 1);
        assert_eq!(scene.snapshot().len(), 2);
    }

    #[test]
    fn explicit_color_recolors_existing_line() {
        let mut scene = scene();
        scene.add_line(1, 0.0, 0.0, None, 3);
        scene.add_line(1, 1.0, 1.0, Some(Color::GREEN), 9);
        let snapshot = scene.snapshot();
        let Primitive::Line(line) = &snapshot.primitives()[0] else {
            panic!("expected line");
        };
        assert_eq!(line.color, Some(Color::GREEN));
        assert_eq!(line.width, 3);
    }

    #[test]
    fn reset_empties_and_switches_bounds() {
        let mut scene = scene();
        scene.add_point(1.0, 1.0, None);
        scene.add_line(1, 1.0, 1.0, None, 1);
        scene.reset(Viewport::new(Range::new(0.0, 1.0), Range::new(0.0, 1.0)));
        assert!(scene.snapshot().is_empty());
        scene.add_line(1, 5.0, 5.0, None, 1);
        let snapshot = scene.snapshot();
        let Primitive::Line(line) = &snapshot.primitives()[0] else {
            panic!("expected line");
        };
        assert_eq!(line.points[0], Point::new(1.0, 1.0));
    }

    #[test]
    fn labels_keep_their_text() {
        let mut scene = scene();
        assert!(scene.add_label(2.0, 60.0, "7.5", None));
        assert!(!scene.add_label(f64::NAN, 1.0, "lost", None));
        let snapshot = scene.snapshot();
        let Primitive::Label { position, text, .. } = &snapshot.primitives()[0] else {
            panic!("expected label");
        };
        assert_eq!(*position, Point::new(2.0, 50.0));
        assert_eq!(text, "7.5");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn rectangle_is_normalized_and_clamped() {
        let mut scene = scene();
        scene.add_rectangle(8.0, 10.0, 5.0, -4.0, true, None);
        let snapshot = scene.snapshot();
        let Primitive::Rectangle(rect) = &snapshot.primitives()[0] else {
            panic!("expected rectangle");
        };
        assert_eq!(rect.min, Point::new(8.0, 6.0));
        assert_eq!(rect.max, Point::new(10.0, 10.0));
    }
}
