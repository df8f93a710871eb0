//! Geometric primitives used by the plotting pipeline.
//!
//! [`Point`] lives in data space. [`ScreenPoint`] and [`ScreenRect`] are pixel
//! coordinates with the origin at the top-left corner of the canvas.

/// A point in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X value in data coordinates.
    pub x: f64,
    /// Y value in data coordinates.
    pub y: f64,
}

impl Point {
    /// Create a new data point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A point in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// X value in pixels.
    pub x: f32,
    /// Y value in pixels.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Check whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A rectangle in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a new screen rectangle from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Build a rectangle from two arbitrary corners.
    pub fn from_corners(a: ScreenPoint, b: ScreenPoint) -> Self {
        Self {
            min: ScreenPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: ScreenPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Rectangle width in pixels.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Rectangle height in pixels.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Check whether the rectangle has positive area.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Check whether a point lies inside the rectangle (edges included).
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Intersection with another rectangle, if any.
    pub fn intersect(&self, other: ScreenRect) -> Option<ScreenRect> {
        let rect = ScreenRect::new(
            ScreenPoint::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            ScreenPoint::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        );
        rect.is_valid().then_some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let rect = ScreenRect::from_corners(ScreenPoint::new(10.0, 2.0), ScreenPoint::new(4.0, 8.0));
        assert_eq!(rect.min, ScreenPoint::new(4.0, 2.0));
        assert_eq!(rect.max, ScreenPoint::new(10.0, 8.0));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(5.0, 5.0));
        let b = ScreenRect::new(ScreenPoint::new(6.0, 6.0), ScreenPoint::new(9.0, 9.0));
        assert!(a.intersect(b).is_none());
        assert!(a.intersect(a).is_some());
    }
}
