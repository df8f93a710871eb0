use realtimeplot::{Plot, PlotConfig};
use tracing_subscriber::EnvFilter;

fn main() -> realtimeplot::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let plot = Plot::with_config(PlotConfig {
        title: "histogram".to_string(),
        ..PlotConfig::default()
    })?;
    let histogram = plot.histogram();
    histogram.set_data(["1", "2", "3", "1", "1.1"])?;
    histogram.add_data(1)?;

    if let Err(err) = histogram.set_data(["4", "five"]) {
        tracing::warn!(%err, "batch rejected");
    }

    // A cheap deterministic spread around 5.
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..2_000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let a = (state % 1_000) as f64 / 1_000.0;
        let b = ((state >> 20) % 1_000) as f64 / 1_000.0;
        histogram.add_data(5.0 + (a + b - 1.0) * 3.0)?;
    }
    histogram.set_frequency(true);

    plot.save("histogram.png")?;
    Ok(())
}
