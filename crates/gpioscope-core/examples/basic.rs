//! Headless strip-chart example.
//!
//! Samples simulated lines for a few ticks, then prints each channel's
//! history and the trajectory cells the dashboard would paint.
//!
//! Run: `cargo run --example basic`

use gpioscope_core::{
    ChannelHistoryStore, SampleSource, ScopeConfig, TrajectoryPoint, TrajectoryTracker,
};

const CONFIG: &str = "\
history_length:32
scale:2
17:North
27:South
22:East
23:West
north:17
south:27
east:22
west:23
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ScopeConfig::parse(CONFIG)?;
    let mut lines = SampleSource::simulated(&config);
    let mut history = ChannelHistoryStore::new(&config.channels, config.history_length);
    let mut tracker = TrajectoryTracker::new(config.axes, config.scale);
    let center = TrajectoryPoint::new(5, 10);

    for _ in 0..config.history_length {
        let samples = lines.sample(&config.channels)?;
        history.append_tick(&samples);
        tracker.track(&history.snapshot(), center);
    }

    let snapshot = history.snapshot();
    let width = config.max_label_len();
    for channel in &config.channels {
        let chart: String = snapshot
            .samples(channel.id)
            .into_iter()
            .flatten()
            .map(|high| if high { '-' } else { '_' })
            .collect();
        println!("{:<width$} {chart}", channel.label);
    }

    let mut grid = vec![vec![' '; 21]; 11];
    for cell in tracker.cells() {
        if let (Ok(row), Ok(col)) = (usize::try_from(cell.row), usize::try_from(cell.col))
            && let Some(slot) = grid.get_mut(row).and_then(|r| r.get_mut(col))
        {
            *slot = cell.glyph.symbol().chars().next().unwrap_or(' ');
        }
    }
    println!();
    for row in grid {
        println!("|{}|", row.into_iter().collect::<String>());
    }
    Ok(())
}
