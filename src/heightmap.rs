//! Bounded 2-D scalar field accumulated from `(x, y, z)` samples.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{PlotError, Result};
use crate::view::{Range, Viewport};

/// One height sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Height at the position.
    pub z: f64,
}

/// Height range used to map `z` onto the color map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightScaling {
    /// Lowest height.
    pub min: f64,
    /// Highest height.
    pub max: f64,
}

impl HeightScaling {
    /// Position of `z` within the scaling, clamped to `[0, 1]`.
    ///
    /// A flat field maps everything to the middle of the color map.
    pub fn fraction(&self, z: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return 0.5;
        }
        ((z - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Scaling state of a height map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleState {
    /// Samples are being added; the color scale may be stale.
    Accumulating,
    /// The color scale covers every sample added so far.
    Scaled,
}

/// Stable view of a height map.
#[derive(Debug, Clone)]
pub struct HeightMapSnapshot {
    bounds: Viewport,
    samples: Arc<Vec<HeightSample>>,
    published: usize,
    scaling: Option<HeightScaling>,
    generation: u64,
}

impl HeightMapSnapshot {
    /// Bounds of the field.
    pub fn bounds(&self) -> Viewport {
        self.bounds
    }

    /// Samples up to and including the last final sample.
    pub fn visible_samples(&self) -> &[HeightSample] {
        &self.samples[..self.published]
    }

    /// Generation the snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scale for coloring: the stored scaling, or the range of visible samples.
    pub fn color_scaling(&self) -> Option<HeightScaling> {
        self.scaling.or_else(|| {
            Range::from_values(self.visible_samples().iter().map(|s| s.z)).map(|range| {
                HeightScaling {
                    min: range.min,
                    max: range.max,
                }
            })
        })
    }
}

#[derive(Debug)]
struct Field {
    bounds: Viewport,
    samples: Arc<Vec<HeightSample>>,
    published: usize,
    scaling: Option<HeightScaling>,
    state: ScaleState,
    generation: u64,
}

/// Thread-safe handle to a height map. Clones share the same field.
#[derive(Debug, Clone)]
pub struct HeightMap {
    field: Arc<Mutex<Field>>,
}

impl HeightMap {
    /// Create an empty field over `[min_x, max_x] x [min_y, max_y]`.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        let bounds = Viewport::new(Range::new(min_x, max_x), Range::new(min_y, max_y));
        if !bounds.is_valid() {
            return Err(PlotError::InvalidConfig(format!(
                "height map bounds [{min_x}, {max_x}] x [{min_y}, {max_y}]"
            )));
        }
        Ok(Self {
            field: Arc::new(Mutex::new(Field {
                bounds,
                samples: Arc::new(Vec::new()),
                published: 0,
                scaling: None,
                state: ScaleState::Accumulating,
                generation: 0,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Field> {
        self.field.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a sample.
    ///
    /// `is_final` marks the end of a sweep: the renderer shows samples up to
    /// the most recent final one. Samples outside the bounds are rejected and
    /// leave the field unchanged.
    pub fn add_data(&self, x: f64, y: f64, z: f64, is_final: bool) -> Result<()> {
        let mut field = self.lock();
        if !field.bounds.contains(x, y) {
            return Err(PlotError::OutOfRange {
                x,
                y,
                bounds: field.bounds,
            });
        }
        if !z.is_finite() {
            return Err(PlotError::InvalidValue {
                value: z.to_string(),
            });
        }
        Arc::make_mut(&mut field.samples).push(HeightSample { x, y, z });
        if is_final {
            field.published = field.samples.len();
        }
        field.state = ScaleState::Accumulating;
        field.generation = field.generation.wrapping_add(1);
        Ok(())
    }

    /// Compute the height range over every sample and switch to `Scaled`.
    ///
    /// Returns `None` and changes nothing when the field is empty.
    pub fn calculate_height_scaling(&self) -> Option<HeightScaling> {
        let samples = Arc::clone(&self.lock().samples);
        let range = Range::from_values(samples.iter().map(|s| s.z))?;
        let scaling = HeightScaling {
            min: range.min,
            max: range.max,
        };

        let mut field = self.lock();
        field.scaling = Some(scaling);
        // Samples that arrived while scanning keep the map Accumulating.
        if field.samples.len() == samples.len() {
            field.state = ScaleState::Scaled;
        }
        field.generation = field.generation.wrapping_add(1);
        debug!(min = scaling.min, max = scaling.max, samples = samples.len(), "height scaling computed");
        Some(scaling)
    }

    /// Current scaling state.
    pub fn state(&self) -> ScaleState {
        self.lock().state
    }

    /// Last computed scaling.
    pub fn scaling(&self) -> Option<HeightScaling> {
        self.lock().scaling
    }

    /// Bounds of the field.
    pub fn bounds(&self) -> Viewport {
        self.lock().bounds
    }

    /// Total number of accepted samples.
    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    /// Check whether no sample has been accepted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generation, bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Snapshot for rendering.
    pub fn snapshot(&self) -> HeightMapSnapshot {
        let field = self.lock();
        HeightMapSnapshot {
            bounds: field.bounds,
            samples: Arc::clone(&field.samples),
            published: field.published,
            scaling: field.scaling,
            generation: field.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep(map: &HeightMap) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for i in 0..50 {
            for j in 0..50 {
                let x = i as f64 / 49.0;
                let y = j as f64 / 49.0;
                let z = (((x - 0.5) * (y - 0.5)).powi(2)).sqrt();
                min = min.min(z);
                max = max.max(z);
                map.add_data(x, y, z, i == 49 && j == 49).unwrap();
            }
        }
        (min, max)
    }

    #[test]
    fn scaling_covers_full_grid() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let (min, max) = sweep(&map);
        assert_eq!(map.state(), ScaleState::Accumulating);

        let scaling = map.calculate_height_scaling().unwrap();
        assert_eq!(scaling.min, min);
        assert_eq!(scaling.max, max);
        assert!((scaling.max - 0.25).abs() < 1e-12);
        assert_eq!(map.state(), ScaleState::Scaled);
        assert_eq!(map.snapshot().visible_samples().len(), 2500);
    }

    #[test]
    fn out_of_range_leaves_field_unchanged() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        map.add_data(0.5, 0.5, 1.0, true).unwrap();
        let generation = map.generation();

        let err = map.add_data(2.0, 0.5, 3.0, true).unwrap_err();
        assert!(matches!(err, PlotError::OutOfRange { x, .. } if x == 2.0));
        assert!(map.add_data(0.5, f64::NAN, 3.0, true).is_err());
        assert!(matches!(
            map.add_data(0.5, 0.5, f64::INFINITY, true),
            Err(PlotError::InvalidValue { .. })
        ));

        assert_eq!(map.len(), 1);
        assert_eq!(map.generation(), generation);
        assert_eq!(map.snapshot().visible_samples().len(), 1);
    }

    #[test]
    fn only_complete_sweeps_are_visible() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        map.add_data(0.1, 0.1, 1.0, false).unwrap();
        assert!(map.snapshot().visible_samples().is_empty());
        map.add_data(0.2, 0.2, 2.0, true).unwrap();
        map.add_data(0.3, 0.3, 9.0, false).unwrap();

        let snapshot = map.snapshot();
        assert_eq!(snapshot.visible_samples().len(), 2);
        assert_eq!(
            snapshot.color_scaling(),
            Some(HeightScaling { min: 1.0, max: 2.0 })
        );
    }

    #[test]
    fn scale_is_kept_until_recomputed() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        map.add_data(0.0, 0.0, 0.0, false).unwrap();
        map.add_data(1.0, 1.0, 1.0, true).unwrap();
        map.calculate_height_scaling();

        map.add_data(0.5, 0.5, 5.0, true).unwrap();
        assert_eq!(map.state(), ScaleState::Accumulating);
        assert_eq!(
            map.snapshot().color_scaling(),
            Some(HeightScaling { min: 0.0, max: 1.0 })
        );
        assert_eq!(map.calculate_height_scaling().unwrap().max, 5.0);
    }

    #[test]
    fn empty_field_has_no_scaling() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        assert!(map.calculate_height_scaling().is_none());
        assert_eq!(map.state(), ScaleState::Accumulating);
        assert!(HeightMap::new(1.0, 1.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn fraction_clamps_and_handles_flat_fields() {
        let scaling = HeightScaling { min: 0.0, max: 2.0 };
        assert_eq!(scaling.fraction(1.0), 0.5);
        assert_eq!(scaling.fraction(-1.0), 0.0);
        assert_eq!(scaling.fraction(3.0), 1.0);
        assert_eq!(HeightScaling { min: 1.0, max: 1.0 }.fraction(1.0), 0.5);
    }
}
