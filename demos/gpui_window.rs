use std::sync::Arc;
use std::time::Duration;

use gpui::{
    AppContext, Application, AsyncWindowContext, Bounds, Timer, WindowBounds, WindowOptions, px,
    size,
};

use realtimeplot::{Color, GpuiPlotView, GpuiSurface, Plot, PlotConfig, RenderConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Application::new().run(|cx| {
        let options = WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                None,
                size(px(720.0), px(560.0)),
                cx,
            ))),
            ..Default::default()
        };

        cx.open_window(options, |window, cx| {
            let surface = GpuiSurface::new();
            let settings = RenderConfig::default();
            let tick = settings.tick;
            let plot = Plot::builder()
                .config(PlotConfig::with_bounds(0.0, 20.0, -1.5, 1.5))
                .render_config(settings)
                .surface(surface.clone())
                .build()
                .map(Arc::new)
                .unwrap();

            let view = cx.new(|_| GpuiPlotView::new(surface).with_plot(Arc::clone(&plot)));
            let refresh = view.clone();
            window
                .spawn(cx, move |cx: &mut AsyncWindowContext| {
                    let mut cx = cx.clone();
                    async move {
                        let mut x = 0.0_f64;
                        loop {
                            Timer::after(tick).await;
                            for _ in 0..4 {
                                plot.line_add_with_color(1, x, x.sin(), Color::BLUE);
                                x = (x + 0.02) % 20.0;
                            }
                            let _ = cx.update(|_, cx| {
                                refresh.update(cx, |_view, view_cx| view_cx.notify());
                            });
                            if x < 0.08 {
                                plot.clear();
                                Timer::after(Duration::from_millis(250)).await;
                            }
                        }
                    }
                })
                .detach();
            view
        })
        .unwrap();
    });
}
