//! Plot entry points and builders.
//!
//! A [`Plot`] owns the shared scene, the attached layers and the redraw thread.
//! Every mutator takes `&self` and only holds the state lock for the duration
//! of the change, so a plot can be fed from several threads at once.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::color::Color;
use crate::config::{PlotConfig, RenderConfig};
use crate::display::{DirtySignal, DisplayHost, HeadlessSurface, Surface};
use crate::error::Result;
use crate::heightmap::HeightMap;
use crate::histogram::Histogram;
use crate::interaction::{pan_viewport, viewport_center, zoom_viewport};
use crate::layer::{Layer, LayerSnapshot};
use crate::render::Renderer;
use crate::scene::{Scene, SceneSnapshot};
use crate::surface::SurfacePlot;
use crate::view::Viewport;

const THREAD_NAME: &str = "realtimeplot-render";

#[derive(Debug)]
struct PlotState {
    scene: Scene,
    layers: Vec<Layer>,
    config: PlotConfig,
    config_generation: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<PlotState>,
    signal: Arc<DirtySignal>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a scene mutation and wake the redraw thread if it changed anything.
    fn mutate(&self, f: impl FnOnce(&mut Scene) -> bool) {
        let changed = f(&mut self.lock().scene);
        if changed {
            self.signal.raise();
        }
    }
}

/// Everything a frame is built from, captured under one short lock.
struct FrameInputs {
    scene: SceneSnapshot,
    layers: Vec<Layer>,
    config: Option<PlotConfig>,
    config_generation: u64,
}

impl Shared {
    fn frame_inputs(&self, applied_config: u64) -> FrameInputs {
        let state = self.lock();
        FrameInputs {
            scene: state.scene.snapshot(),
            layers: state.layers.clone(),
            config: (state.config_generation != applied_config).then(|| state.config.clone()),
            config_generation: state.config_generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameKey {
    scene: u64,
    layers: Vec<u64>,
    config: u64,
    size: (u32, u32),
}

/// A real-time plot with its own redraw thread.
///
/// Dropping the plot stops the redraw thread, waits for it to finish and then
/// releases the surface.
#[derive(Debug)]
pub struct Plot {
    shared: Arc<Shared>,
    settings: RenderConfig,
    host: DisplayHost,
}

impl Plot {
    /// Create a plot with the default config and a headless surface.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a plot with the given config and a headless surface.
    pub fn with_config(config: PlotConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Start building a plot with custom configuration.
    pub fn builder() -> PlotBuilder {
        PlotBuilder::default()
    }

    /// Add a point marker in the foreground color.
    pub fn point(&self, x: f64, y: f64) {
        self.shared.mutate(|scene| scene.add_point(x, y, None));
    }

    /// Add a point marker in the given color.
    pub fn point_with_color(&self, x: f64, y: f64, color: Color) {
        self.shared.mutate(|scene| scene.add_point(x, y, Some(color)));
    }

    /// Append a vertex to line `id`, creating the line if needed.
    pub fn line_add(&self, id: i64, x: f64, y: f64) {
        self.shared.mutate(|scene| scene.add_line(id, x, y, None, 1));
    }

    /// Append a vertex to line `id` and set the line color.
    pub fn line_add_with_color(&self, id: i64, x: f64, y: f64, color: Color) {
        self.shared
            .mutate(|scene| scene.add_line(id, x, y, Some(color), 1));
    }

    /// Append a vertex to line `id`; `width` applies when the line is created.
    pub fn line_add_styled(&self, id: i64, x: f64, y: f64, color: Color, width: u32) {
        self.shared
            .mutate(|scene| scene.add_line(id, x, y, Some(color), width));
    }

    /// Write a number at a data position.
    pub fn number(&self, x: f64, y: f64, value: f64) {
        self.label(x, y, format!("{value}"));
    }

    /// Write a text label at a data position.
    pub fn label(&self, x: f64, y: f64, text: impl Into<String>) {
        let text = text.into();
        self.shared.mutate(|scene| scene.add_label(x, y, text, None));
    }

    /// Add a rectangle of `width_x` by `width_y` anchored at `(min_x, min_y)`.
    pub fn rectangle(
        &self,
        min_x: f64,
        min_y: f64,
        width_x: f64,
        width_y: f64,
        fill: bool,
        color: Option<Color>,
    ) {
        self.shared.mutate(|scene| {
            scene.add_rectangle(min_x, min_y, width_x, width_y, fill, color)
        });
    }

    /// Remove every primitive, keeping the config.
    pub fn clear(&self) {
        self.shared.mutate(|scene| {
            scene.clear();
            true
        });
    }

    /// Apply a new config: clears the scene and rebuilds the mapping.
    ///
    /// An invalid config is rejected and the plot is left unchanged.
    pub fn reset(&self, config: PlotConfig) -> Result<()> {
        config.validate()?;
        {
            let mut state = self.shared.lock();
            state.scene.reset(config.viewport());
            debug!(
                min_x = config.min_x,
                max_x = config.max_x,
                min_y = config.min_y,
                max_y = config.max_y,
                "plot reset"
            );
            state.config = config;
            state.config_generation += 1;
        }
        self.shared.signal.raise();
        Ok(())
    }

    /// Shift the visible bounds by whole steps of a tenth of the span.
    ///
    /// Positive steps move the view towards larger values. The scene is kept.
    pub fn pan(&self, steps_x: i32, steps_y: i32) {
        self.update_viewport(|viewport| pan_viewport(viewport, steps_x, steps_y));
    }

    /// Scale the visible bounds around their center. The scene is kept.
    ///
    /// Factors above one zoom out; non-positive or non-finite factors are ignored.
    pub fn zoom(&self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            warn!(factor, "ignoring invalid zoom factor");
            return;
        }
        self.update_viewport(|viewport| {
            zoom_viewport(viewport, viewport_center(viewport), factor, factor)
        });
    }

    fn update_viewport(&self, f: impl FnOnce(Viewport) -> Viewport) {
        {
            let mut state = self.shared.lock();
            let next = f(state.config.viewport());
            if !next.is_valid() {
                warn!("ignoring bounds change to an empty range");
                return;
            }
            state.config.set_viewport(next);
            state.scene.set_bounds(next);
            state.config_generation += 1;
        }
        self.shared.signal.raise();
    }

    /// Attach an aggregation; it is drawn beneath the scene from the next frame on.
    pub fn attach(&self, layer: impl Into<Layer>) {
        self.shared.lock().layers.push(layer.into());
        self.shared.signal.raise();
    }

    /// Create a histogram attached to this plot.
    pub fn histogram(&self) -> Histogram {
        let histogram = Histogram::new();
        self.attach(histogram.clone());
        histogram
    }

    /// Create a height map over the given bounds attached to this plot.
    pub fn height_map(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<HeightMap> {
        let map = HeightMap::new(min_x, max_x, min_y, max_y)?;
        self.attach(map.clone());
        Ok(map)
    }

    /// Create a density grid over the given bounds attached to this plot.
    pub fn surface_plot(
        &self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        resolution: usize,
    ) -> Result<SurfacePlot> {
        let surface = SurfacePlot::new(min_x, max_x, min_y, max_y, resolution)?;
        self.attach(surface.clone());
        Ok(surface)
    }

    /// Number of attached layers.
    pub fn layer_count(&self) -> usize {
        self.shared.lock().layers.len()
    }

    /// Current config.
    pub fn config(&self) -> PlotConfig {
        self.shared.lock().config.clone()
    }

    /// Renderer settings.
    pub fn render_config(&self) -> &RenderConfig {
        &self.settings
    }

    /// Snapshot of the scene as the renderer would see it now.
    pub fn snapshot(&self) -> SceneSnapshot {
        self.shared.lock().scene.snapshot()
    }

    /// Wake the redraw thread without changing anything.
    pub fn request_redraw(&self) {
        self.host.request_redraw();
    }

    /// Render the current state on the calling thread and write it as a PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let (scene, layers, config) = {
            let state = self.shared.lock();
            (state.scene.snapshot(), state.layers.clone(), state.config.clone())
        };
        let mut renderer = Renderer::new(config, self.settings.clone())?;
        let layers: Vec<LayerSnapshot> = layers.iter().map(Layer::snapshot).collect();
        let frame = renderer.render(&scene, &layers);
        frame.save_png(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "plot saved");
        Ok(())
    }

    /// Stop the redraw thread and release the surface.
    pub fn close(self) {
        drop(self);
    }
}

/// Builder for configuring a plot before construction.
#[derive(Default)]
pub struct PlotBuilder {
    config: PlotConfig,
    settings: RenderConfig,
    surface: Option<Box<dyn Surface>>,
}

impl std::fmt::Debug for PlotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotBuilder")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("surface", &self.surface.as_ref().map(|_| ".."))
            .finish()
    }
}

impl PlotBuilder {
    /// Set the initial plot config.
    pub fn config(mut self, config: PlotConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the renderer settings.
    pub fn render_config(mut self, settings: RenderConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Present frames to the given surface instead of a headless one.
    pub fn surface(mut self, surface: impl Surface) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Open the surface and start the redraw thread.
    ///
    /// Nothing keeps running if any step fails.
    pub fn build(self) -> Result<Plot> {
        let Self {
            config,
            settings,
            surface,
        } = self;
        config.validate()?;
        settings.validate()?;
        let mut surface = surface.unwrap_or_else(|| Box::new(HeadlessSurface::new()));
        surface.open(&config)?;
        let renderer = Renderer::new(config.clone(), settings.clone())?;

        let signal = Arc::new(DirtySignal::new());
        let shared = Arc::new(Shared {
            state: Mutex::new(PlotState {
                scene: Scene::new(config.viewport()),
                layers: Vec::new(),
                config,
                config_generation: 0,
            }),
            signal: Arc::clone(&signal),
        });

        let draw = redraw(Arc::clone(&shared), renderer, surface);
        let host = DisplayHost::spawn(THREAD_NAME, settings.tick, signal, draw)?;
        // First frame without waiting for a tick.
        host.request_redraw();
        Ok(Plot {
            shared,
            settings,
            host,
        })
    }
}

/// Redraw callback run on the display thread.
fn redraw(
    shared: Arc<Shared>,
    mut renderer: Renderer,
    mut surface: Box<dyn Surface>,
) -> impl FnMut(bool) + Send + 'static {
    let mut applied_config = 0;
    let mut last_key: Option<FrameKey> = None;
    move |_dirty| {
        let inputs = shared.frame_inputs(applied_config);
        if let Some(config) = inputs.config {
            if let Err(err) = renderer.reset(config) {
                warn!(%err, "renderer rejected config");
            }
        }
        applied_config = inputs.config_generation;

        if let Some((width, height)) = surface.size() {
            let canvas = renderer.canvas();
            if (canvas.width(), canvas.height()) != (width, height) {
                if let Err(err) = renderer.resize(width, height) {
                    warn!(%err, width, height, "cannot resize canvas to surface");
                }
            }
        }

        let key = FrameKey {
            scene: inputs.scene.generation(),
            layers: inputs.layers.iter().map(Layer::generation).collect(),
            config: inputs.config_generation,
            size: (renderer.canvas().width(), renderer.canvas().height()),
        };
        if last_key.as_ref() == Some(&key) {
            return;
        }

        let layers: Vec<LayerSnapshot> = inputs.layers.iter().map(Layer::snapshot).collect();
        let frame = renderer.render(&inputs.scene, &layers);
        if let Err(err) = surface.present(&frame) {
            warn!(%err, sequence = frame.sequence(), "surface rejected frame");
        }
        last_key = Some(key);
    }
}
