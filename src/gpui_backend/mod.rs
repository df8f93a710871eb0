//! gpui integration for realtimeplot.
//!
//! [`GpuiSurface`] receives frames from a plot's redraw thread and
//! [`GpuiPlotView`] paints the most recent one inside a gpui window.

mod paint;
mod view;

pub use view::{GpuiPlotView, GpuiSurface};
