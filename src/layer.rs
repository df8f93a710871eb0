//! Aggregations attached to a plot and drawn beneath the scene.

use crate::heightmap::{HeightMap, HeightMapSnapshot};
use crate::histogram::{Histogram, HistogramSnapshot};
use crate::surface::{SurfacePlot, SurfaceSnapshot};
use crate::view::{Range, Viewport};

/// An aggregation handle attached to a plot.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Histogram bars.
    Histogram(Histogram),
    /// Colored height field.
    HeightMap(HeightMap),
    /// Grey-scale density grid.
    Surface(SurfacePlot),
}

impl Layer {
    /// Generation of the underlying aggregation.
    pub fn generation(&self) -> u64 {
        match self {
            Self::Histogram(histogram) => histogram.generation(),
            Self::HeightMap(map) => map.generation(),
            Self::Surface(surface) => surface.generation(),
        }
    }

    /// Take a stable snapshot for rendering.
    pub fn snapshot(&self) -> LayerSnapshot {
        match self {
            Self::Histogram(histogram) => LayerSnapshot::Histogram(histogram.snapshot()),
            Self::HeightMap(map) => LayerSnapshot::HeightMap(map.snapshot()),
            Self::Surface(surface) => LayerSnapshot::Surface(surface.snapshot()),
        }
    }
}

impl From<Histogram> for Layer {
    fn from(histogram: Histogram) -> Self {
        Self::Histogram(histogram)
    }
}

impl From<HeightMap> for Layer {
    fn from(map: HeightMap) -> Self {
        Self::HeightMap(map)
    }
}

impl From<SurfacePlot> for Layer {
    fn from(surface: SurfacePlot) -> Self {
        Self::Surface(surface)
    }
}

/// Snapshot of one layer.
#[derive(Debug, Clone)]
pub enum LayerSnapshot {
    /// Binned histogram.
    Histogram(HistogramSnapshot),
    /// Published height-map samples.
    HeightMap(HeightMapSnapshot),
    /// Density grid counts.
    Surface(SurfaceSnapshot),
}

impl LayerSnapshot {
    /// Data bounds the layer wants to be shown in.
    pub fn fit_bounds(&self) -> Option<Viewport> {
        match self {
            Self::Histogram(histogram) => histogram.fit_bounds(),
            Self::HeightMap(map) => Some(map.bounds()),
            Self::Surface(surface) => Some(surface.bounds()),
        }
    }
}

/// Union of the bounds requested by `layers`, if any layer requests one.
pub fn fit_layers(layers: &[LayerSnapshot]) -> Option<Viewport> {
    layers
        .iter()
        .filter_map(LayerSnapshot::fit_bounds)
        .reduce(|a, b| {
            Viewport::new(
                Range::new(a.x.min.min(b.x.min), a.x.max.max(b.x.max)),
                Range::new(a.y.min.min(b.y.min), a.y.max.max(b.y.max)),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_unions_layer_bounds() {
        let map = HeightMap::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let surface = SurfacePlot::new(-1.0, 0.5, 0.5, 3.0, 4).unwrap();
        let layers = [Layer::from(map).snapshot(), Layer::from(surface).snapshot()];
        let bounds = fit_layers(&layers).unwrap();
        assert_eq!(bounds.x, Range::new(-1.0, 1.0));
        assert_eq!(bounds.y, Range::new(0.0, 3.0));
    }

    #[test]
    fn empty_histogram_requests_nothing() {
        let layers = [Layer::from(Histogram::new()).snapshot()];
        assert!(fit_layers(&layers).is_none());
        assert!(fit_layers(&[]).is_none());
    }
}
