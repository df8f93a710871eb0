//! Bounds manipulation for panning and zooming a plot.
//!
//! Keyboard-style navigation moves the plot by whole steps of a tenth of the
//! visible span; zooming scales the bounds around a center point.

use crate::geom::Point;
use crate::view::{Range, Viewport};

/// Fraction of the visible span moved by one pan step.
pub(crate) const PAN_STEP_FRAC: f64 = 0.1;

/// Shift a viewport by whole pan steps along each axis.
pub(crate) fn pan_viewport(viewport: Viewport, steps_x: i32, steps_y: i32) -> Viewport {
    let dx = viewport.x.span() * PAN_STEP_FRAC * steps_x as f64;
    let dy = viewport.y.span() * PAN_STEP_FRAC * steps_y as f64;
    Viewport::new(
        Range::new(viewport.x.min + dx, viewport.x.max + dx),
        Range::new(viewport.y.min + dy, viewport.y.max + dy),
    )
}

/// Zoom a viewport around a center point.
///
/// Factors above one enlarge the visible span (zoom out).
pub(crate) fn zoom_viewport(
    viewport: Viewport,
    center: Point,
    factor_x: f64,
    factor_y: f64,
) -> Viewport {
    let x_min = center.x + (viewport.x.min - center.x) * factor_x;
    let x_max = center.x + (viewport.x.max - center.x) * factor_x;
    let y_min = center.y + (viewport.y.min - center.y) * factor_y;
    let y_max = center.y + (viewport.y.max - center.y) * factor_y;
    Viewport::new(Range::new(x_min, x_max), Range::new(y_min, y_max))
}

/// Center of a viewport in data space.
pub(crate) fn viewport_center(viewport: Viewport) -> Point {
    Point::new(viewport.x.center(), viewport.y.center())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Viewport {
        Viewport::new(Range::new(0.0, 10.0), Range::new(0.0, 50.0))
    }

    #[test]
    fn pan_moves_by_tenth_of_span() {
        let moved = pan_viewport(unit(), 1, -2);
        assert!((moved.x.min - 1.0).abs() < 1e-12);
        assert!((moved.x.max - 11.0).abs() < 1e-12);
        assert!((moved.y.min + 10.0).abs() < 1e-12);
        assert!((moved.y.span() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn zoom_keeps_center() {
        let viewport = unit();
        let zoomed = zoom_viewport(viewport, viewport_center(viewport), 0.5, 0.5);
        assert!((zoomed.x.span() - 5.0).abs() < 1e-12);
        assert!((zoomed.x.center() - 5.0).abs() < 1e-12);
        assert!((zoomed.y.center() - 25.0).abs() < 1e-12);
    }
}
