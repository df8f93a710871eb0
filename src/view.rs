//! Data ranges and plot bounds.

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint of the range.
    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check whether the range has positive span and finite bounds.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.span() > 0.0
    }

    /// Check whether a value lies inside the range (bounds included).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Expand the range to include a value.
    pub fn expand_to_include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Clamp a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Ensure the range has at least the given span.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let span = self.span();
        if span >= min_span {
            return *self;
        }
        let center = self.center();
        let half = min_span * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Build the range covering every finite value of an iterator.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut range: Option<Range> = None;
        for value in values {
            if !value.is_finite() {
                continue;
            }
            match range.as_mut() {
                None => range = Some(Range::new(value, value)),
                Some(existing) => existing.expand_to_include(value),
            }
        }
        range
    }
}

/// Visible data ranges on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X axis range.
    pub x: Range,
    /// Y axis range.
    pub y: Range,
}

impl Viewport {
    /// Create a viewport from X and Y ranges.
    pub fn new(x: Range, y: Range) -> Self {
        Self { x, y }
    }

    /// Check whether both axes are valid.
    pub fn is_valid(&self) -> bool {
        self.x.is_valid() && self.y.is_valid()
    }

    /// Check whether a data position lies inside both ranges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x.contains(x) && self.y.contains(y)
    }

    /// Clamp a data position into the viewport.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.clamp(x), self.y.clamp(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_min_span_expands() {
        let range = Range::new(2.0, 2.0);
        let expanded = range.with_min_span(1.0);
        assert!(expanded.span() >= 1.0);
        assert!((expanded.center() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn from_values_skips_non_finite() {
        let range = Range::from_values([3.0, f64::NAN, -1.0, f64::INFINITY]).unwrap();
        assert_eq!(range, Range::new(-1.0, 3.0));
        assert!(Range::from_values([f64::NAN]).is_none());
    }

    #[test]
    fn viewport_clamp_pulls_into_bounds() {
        let viewport = Viewport::new(Range::new(0.0, 10.0), Range::new(0.0, 50.0));
        assert_eq!(viewport.clamp(-3.0, 80.0), (0.0, 50.0));
        assert_eq!(viewport.clamp(4.0, 7.0), (4.0, 7.0));
    }
}
