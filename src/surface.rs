//! Two-dimensional density grid counting hits per cell.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::MAX_GRID_RESOLUTION;
use crate::error::{PlotError, Result};
use crate::view::{Range, Viewport};

/// Stable view of a surface plot.
#[derive(Debug, Clone)]
pub struct SurfaceSnapshot {
    bounds: Viewport,
    resolution: usize,
    counts: Arc<Vec<usize>>,
    max_count: usize,
    generation: u64,
}

impl SurfaceSnapshot {
    /// Bounds of the grid.
    pub fn bounds(&self) -> Viewport {
        self.bounds
    }

    /// Cells per axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Hit count of cell `(column, row)`, row 0 at the bottom.
    pub fn count(&self, column: usize, row: usize) -> usize {
        if column >= self.resolution || row >= self.resolution {
            return 0;
        }
        self.counts[row * self.resolution + column]
    }

    /// Highest cell count.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Generation the snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Data-space corners of a cell.
    pub fn cell_bounds(&self, column: usize, row: usize) -> Viewport {
        let width = self.bounds.x.span() / self.resolution as f64;
        let height = self.bounds.y.span() / self.resolution as f64;
        let x = self.bounds.x.min + width * column as f64;
        let y = self.bounds.y.min + height * row as f64;
        Viewport::new(Range::new(x, x + width), Range::new(y, y + height))
    }
}

#[derive(Debug)]
struct Grid {
    bounds: Viewport,
    resolution: usize,
    counts: Arc<Vec<usize>>,
    max_count: usize,
    generation: u64,
}

/// Thread-safe density grid handle. Clones share the same grid.
#[derive(Debug, Clone)]
pub struct SurfacePlot {
    grid: Arc<Mutex<Grid>>,
}

impl SurfacePlot {
    /// Create an empty `resolution` x `resolution` grid over the bounds.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64, resolution: usize) -> Result<Self> {
        let bounds = Viewport::new(Range::new(min_x, max_x), Range::new(min_y, max_y));
        let cells = (bounds.is_valid() && (1..=MAX_GRID_RESOLUTION).contains(&resolution))
            .then(|| resolution.checked_mul(resolution))
            .flatten();
        let Some(cells) = cells else {
            return Err(PlotError::InvalidConfig(format!(
                "surface plot bounds [{min_x}, {max_x}] x [{min_y}, {max_y}] at resolution {resolution}"
            )));
        };
        Ok(Self {
            grid: Arc::new(Mutex::new(Grid {
                bounds,
                resolution,
                counts: Arc::new(vec![0; cells]),
                max_count: 0,
                generation: 0,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count a hit at `(x, y)`. Returns `false` if the point is outside the bounds.
    pub fn add_data(&self, x: f64, y: f64) -> bool {
        let mut grid = self.lock();
        if !grid.bounds.contains(x, y) {
            return false;
        }
        let column = cell_index(grid.bounds.x, grid.resolution, x);
        let row = cell_index(grid.bounds.y, grid.resolution, y);
        let index = row * grid.resolution + column;
        let counts = Arc::make_mut(&mut grid.counts);
        counts[index] += 1;
        let count = counts[index];
        grid.max_count = grid.max_count.max(count);
        grid.generation = grid.generation.wrapping_add(1);
        true
    }

    /// Reset every cell to zero.
    pub fn clear(&self) {
        let mut grid = self.lock();
        let cells = grid.resolution * grid.resolution;
        grid.counts = Arc::new(vec![0; cells]);
        grid.max_count = 0;
        grid.generation = grid.generation.wrapping_add(1);
    }

    /// Bounds of the grid.
    pub fn bounds(&self) -> Viewport {
        self.lock().bounds
    }

    /// Generation, bumped by every accepted hit.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Snapshot for rendering.
    pub fn snapshot(&self) -> SurfaceSnapshot {
        let grid = self.lock();
        SurfaceSnapshot {
            bounds: grid.bounds,
            resolution: grid.resolution,
            counts: Arc::clone(&grid.counts),
            max_count: grid.max_count,
            generation: grid.generation,
        }
    }
}

/// Cell index of `value` within `range`; the upper bound falls in the last cell.
pub(crate) fn cell_index(range: Range, resolution: usize, value: f64) -> usize {
    let fraction = (value - range.min) / range.span();
    let index = (fraction * resolution as f64).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(resolution - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_in_bound_points() {
        let surface = SurfacePlot::new(0.0, 1.0, 0.0, 1.0, 4).unwrap();
        assert!(surface.add_data(0.1, 0.1));
        assert!(surface.add_data(0.2, 0.2));
        assert!(surface.add_data(1.0, 1.0));
        assert!(!surface.add_data(1.5, 0.5));
        assert!(!surface.add_data(f64::NAN, 0.5));

        let snapshot = surface.snapshot();
        assert_eq!(snapshot.count(0, 0), 2);
        assert_eq!(snapshot.count(3, 3), 1);
        assert_eq!(snapshot.max_count(), 2);
        let total: usize = (0..4)
            .flat_map(|c| (0..4).map(move |r| (c, r)))
            .map(|(c, r)| snapshot.count(c, r))
            .sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn cell_bounds_tile_the_grid() {
        let surface = SurfacePlot::new(0.0, 2.0, 0.0, 4.0, 2).unwrap();
        let cell = surface.snapshot().cell_bounds(1, 1);
        assert_eq!(cell.x, Range::new(1.0, 2.0));
        assert_eq!(cell.y, Range::new(2.0, 4.0));
    }

    #[test]
    fn clear_resets_counts() {
        let surface = SurfacePlot::new(0.0, 1.0, 0.0, 1.0, 2).unwrap();
        surface.add_data(0.5, 0.5);
        surface.clear();
        assert_eq!(surface.snapshot().max_count(), 0);
        assert!(SurfacePlot::new(0.0, 1.0, 0.0, 1.0, 0).is_err());
    }

    #[test]
    fn oversized_resolution_is_rejected() {
        for resolution in [MAX_GRID_RESOLUTION + 1, usize::MAX] {
            assert!(matches!(
                SurfacePlot::new(0.0, 1.0, 0.0, 1.0, resolution),
                Err(PlotError::InvalidConfig(_))
            ));
        }
        assert!(SurfacePlot::new(0.0, 1.0, 0.0, 1.0, MAX_GRID_RESOLUTION).is_ok());
    }
}
