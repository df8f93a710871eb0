//! Display surfaces and the background redraw host.
//!
//! A [`Surface`] receives finished frames. The [`DisplayHost`] owns the redraw
//! thread that produces them; it wakes on a fixed tick or when a
//! [`DirtySignal`] is raised, and joins the thread when dropped.

mod host;

use std::sync::{Arc, Mutex, MutexGuard};

pub use host::{DirtySignal, DisplayHost};

use crate::config::PlotConfig;
use crate::error::Result;
use crate::render::Frame;

/// Destination for rendered frames.
///
/// Surfaces are moved onto the redraw thread and dropped there after the
/// last frame.
pub trait Surface: Send + 'static {
    /// Prepare the surface for a plot. Called once before the redraw thread
    /// starts; an error aborts plot construction.
    fn open(&mut self, config: &PlotConfig) -> Result<()> {
        let _ = config;
        Ok(())
    }

    /// Requested canvas size in pixels, or `None` to follow the plot config.
    fn size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Show a frame.
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

impl Surface for Box<dyn Surface> {
    fn open(&mut self, config: &PlotConfig) -> Result<()> {
        (**self).open(config)
    }

    fn size(&self) -> Option<(u32, u32)> {
        (**self).size()
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        (**self).present(frame)
    }
}

#[derive(Debug, Default)]
struct Presented {
    last: Option<Frame>,
    count: u64,
    title: Option<String>,
}

/// In-memory surface keeping the most recent frame.
///
/// Clones observe the same frames, so a test or a host application can keep
/// a clone while the original is handed to a plot.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    presented: Arc<Mutex<Presented>>,
    size: Option<(u32, u32)>,
}

impl HeadlessSurface {
    /// Create a surface following the plot config size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface requesting a fixed canvas size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            presented: Arc::default(),
            size: Some((width, height)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Presented> {
        self.presented
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Most recently presented frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.lock().last.clone()
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.lock().count
    }

    /// Title passed by the plot that opened the surface.
    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }
}

impl Surface for HeadlessSurface {
    fn open(&mut self, config: &PlotConfig) -> Result<()> {
        self.lock().title = Some(config.title.clone());
        Ok(())
    }

    fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        let mut presented = self.lock();
        presented.last = Some(frame.clone());
        presented.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::render::Renderer;
    use crate::scene::Scene;

    #[test]
    fn clones_share_presented_frames() {
        let surface = HeadlessSurface::new();
        let mut handed_out = surface.clone();
        let config = PlotConfig::default();
        handed_out.open(&config).unwrap();

        let mut renderer = Renderer::new(config.clone(), RenderConfig::default()).unwrap();
        let frame = renderer.render(&Scene::new(config.viewport()).snapshot(), &[]);
        handed_out.present(&frame).unwrap();
        handed_out.present(&frame).unwrap();

        assert_eq!(surface.frame_count(), 2);
        assert_eq!(surface.last_frame().map(|f| f.size()), Some((580, 580)));
        assert_eq!(surface.title().as_deref(), Some("RealTimePlot"));
    }

    #[test]
    fn boxed_surface_forwards_size() {
        let boxed: Box<dyn Surface> = Box::new(HeadlessSurface::with_size(64, 48));
        assert_eq!(boxed.size(), Some((64, 48)));
    }
}
