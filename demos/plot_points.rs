use std::thread;
use std::time::Duration;

use realtimeplot::{Color, Plot, PlotConfig};
use tracing_subscriber::EnvFilter;

fn main() -> realtimeplot::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let plot = Plot::with_config(PlotConfig {
        title: "points".to_string(),
        ..PlotConfig::with_bounds(0.0, 10.0, -1.5, 1.5)
    })?;

    thread::scope(|scope| {
        let plot = &plot;
        scope.spawn(move || {
            for i in 0..200 {
                let x = i as f64 * 0.05;
                plot.line_add_with_color(1, x, x.sin(), Color::BLUE);
                plot.line_add_with_color(2, x, x.cos(), Color::ORANGE);
                thread::sleep(Duration::from_millis(5));
            }
        });
        scope.spawn(move || {
            for i in 0..100 {
                let x = i as f64 * 0.1;
                plot.point_with_color(x, (x * 0.7).sin() * 0.5, Color::by_id(i));
                thread::sleep(Duration::from_millis(10));
            }
        });
    });

    plot.rectangle(4.0, -0.25, 2.0, 0.5, false, Some(Color::RED));
    plot.save("points.png")?;
    Ok(())
}
