use std::sync::{Arc, Mutex, MutexGuard};

use gpui::prelude::*;
use gpui::{Pixels, ScrollWheelEvent, Window, canvas, div, px};

use crate::color::Color;
use crate::config::PlotConfig;
use crate::display::Surface;
use crate::error::Result;
use crate::geom::ScreenPoint;
use crate::plot::Plot;
use crate::render::Frame;

use super::paint::{paint_list, to_hsla};

#[derive(Debug, Default)]
struct Latest {
    frame: Option<Frame>,
    size: Option<(u32, u32)>,
    title: Option<String>,
}

/// Surface handing frames from the redraw thread to a [`GpuiPlotView`].
///
/// Give one clone to the plot builder and the other to the view.
#[derive(Debug, Clone, Default)]
pub struct GpuiSurface {
    latest: Arc<Mutex<Latest>>,
}

impl GpuiSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Latest> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Title of the plot feeding this surface.
    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }
}

impl Surface for GpuiSurface {
    fn open(&mut self, config: &PlotConfig) -> Result<()> {
        self.lock().title = Some(config.title.clone());
        Ok(())
    }

    fn size(&self) -> Option<(u32, u32)> {
        self.lock().size
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.lock().frame = Some(frame.clone());
        Ok(())
    }
}

/// A gpui view painting the latest frame of a plot.
///
/// The view reports its size back to the surface, so the redraw thread
/// renders at the window size. Call `cx.notify()` on the entity to repaint.
pub struct GpuiPlotView {
    surface: GpuiSurface,
    plot: Option<Arc<Plot>>,
    background: Color,
}

impl GpuiPlotView {
    /// Create a view showing frames presented to `surface`.
    pub fn new(surface: GpuiSurface) -> Self {
        Self {
            surface,
            plot: None,
            background: Color::WHITE,
        }
    }

    /// Zoom the plot with the scroll wheel.
    pub fn with_plot(mut self, plot: Arc<Plot>) -> Self {
        self.background = plot.render_config().background;
        self.plot = Some(plot);
        self
    }

    fn on_scroll(&mut self, ev: &ScrollWheelEvent, cx: &mut Context<Self>) {
        let Some(plot) = self.plot.as_ref() else {
            return;
        };
        let line_height = px(16.0);
        let delta = ev.delta.pixel_delta(line_height);
        let zoom_delta = -f32::from(delta.y);
        if zoom_delta.abs() < 0.01 {
            return;
        }
        let factor = (1.0 - (zoom_delta as f64 * 0.002)).clamp(0.1, 10.0);
        plot.zoom(factor);
        cx.notify();
    }
}

impl Render for GpuiPlotView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let surface = self.surface.clone();

        div()
            .size_full()
            .bg(to_hsla(self.background))
            .child(
                canvas(
                    move |bounds, _, _| {
                        let mut latest = surface.lock();
                        let width = f32::from(bounds.size.width).round().max(1.0) as u32;
                        let height = f32::from(bounds.size.height).round().max(1.0) as u32;
                        latest.size = Some((width, height));
                        (latest.frame.clone(), origin(bounds.origin))
                    },
                    move |_, (frame, origin), window, cx| {
                        if let Some(frame) = frame {
                            paint_list(frame.render_list(), origin, window, cx);
                        }
                    },
                )
                .size_full(),
            )
            .on_scroll_wheel(cx.listener(|this, ev, _, cx| {
                this.on_scroll(ev, cx);
            }))
    }
}

fn origin(point: gpui::Point<Pixels>) -> ScreenPoint {
    ScreenPoint::new(f32::from(point.x), f32::from(point.y))
}
