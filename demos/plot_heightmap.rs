use realtimeplot::{Plot, PlotConfig};
use tracing_subscriber::EnvFilter;

fn main() -> realtimeplot::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let plot = Plot::with_config(PlotConfig {
        title: "height map".to_string(),
        ..PlotConfig::with_bounds(0.0, 1.0, 0.0, 1.0)
    })?;
    let map = plot.height_map(0.0, 1.0, 0.0, 1.0)?;

    for i in 0..50 {
        for j in 0..50 {
            let x = i as f64 / 49.0;
            let y = j as f64 / 49.0;
            let z = (((x - 0.5) * (y - 0.5)).powi(2)).sqrt();
            map.add_data(x, y, z, i == 49 && j == 49)?;
        }
    }
    if let Some(scaling) = map.calculate_height_scaling() {
        tracing::info!(min = scaling.min, max = scaling.max, "height scaling");
    }

    let density = plot.surface_plot(0.0, 1.0, 0.0, 1.0, 20)?;
    for i in 0..400 {
        let t = i as f64 / 400.0;
        density.add_data(t, t * t);
    }

    plot.save("heightmap.png")?;
    Ok(())
}
