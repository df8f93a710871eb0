//! realtimeplot is a real-time plotting engine for long-running processes.
//! Points, lines, histograms and height maps are fed from any thread while a
//! background thread redraws the plot on a fixed tick.

#![forbid(unsafe_code)]

pub mod canvas;
pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod geom;
pub mod heightmap;
pub mod histogram;
mod interaction;
pub mod layer;
pub mod plot;
pub mod render;
pub mod scene;
pub mod surface;
pub mod transform;
pub mod view;

#[cfg(feature = "gpui")]
pub mod gpui_backend;

pub use canvas::Canvas;
pub use color::{Color, ColorMap};
pub use config::{PlotConfig, RenderConfig};
pub use display::{DirtySignal, DisplayHost, HeadlessSurface, Surface};
pub use error::{PlotError, Result};
pub use geom::{Point, ScreenPoint, ScreenRect};
pub use heightmap::{HeightMap, HeightMapSnapshot, HeightSample, HeightScaling, ScaleState};
pub use histogram::{Bin, BinRule, Histogram, HistogramSnapshot, IntoSample};
pub use layer::{Layer, LayerSnapshot};
pub use plot::{Plot, PlotBuilder};
pub use render::{Frame, RenderCommand, RenderList, Renderer, ScreenSegment, TextStyle};
pub use scene::{LineSegment, Primitive, Rectangle, SceneSnapshot};
pub use surface::{SurfacePlot, SurfaceSnapshot};
pub use transform::Transform;
pub use view::{Range, Viewport};

#[cfg(feature = "gpui")]
pub use gpui_backend::{GpuiPlotView, GpuiSurface};
