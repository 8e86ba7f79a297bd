use gpioscope_core::Bank;

use super::Options;
use crate::tui::app::AppError;

/// Print the configured channels and read each one once.
pub fn run(opts: &Options) -> Result<(), AppError> {
    let config = super::load_config(opts)?;

    println!("Config: {}", opts.config.display());
    println!(
        "  polling {:.2}s  history {}  scale {}  log {}",
        config.polling_interval.as_secs_f64(),
        config.history_length,
        config.scale,
        config.db_path.display()
    );
    match config.expander {
        Some(exp) => println!("  expander: bus {} address {:#04x}", exp.bus, exp.address),
        None => println!("  expander: disabled"),
    }

    let mut lines = super::open_lines(&config, opts.simulate)?;
    println!("  readers:  {}", lines.reader_names().join(", "));
    let samples = lines.sample(&config.channels)?;

    println!("\nFound {} channel(s):\n", config.channels.len());
    let width = config.max_label_len();
    for (channel, (_, high)) in config.channels.iter().zip(&samples) {
        let bank = match channel.bank() {
            Bank::Primary { line } => format!("line {line}"),
            Bank::Expander { line } => format!("expander {line}"),
        };
        let state = if *high { "high" } else { "low" };
        println!("  {:<width$}  {:>4}  {:<12} {state}", channel.label, channel.id.get(), bank);
    }

    let axes = config.axes;
    if axes.is_configured() {
        let show = |axis: Option<gpioscope_core::ChannelId>| {
            axis.map_or_else(|| "-".to_string(), |id| id.to_string())
        };
        println!(
            "\nTrajectory axes: north {}  south {}  east {}  west {}",
            show(axes.north),
            show(axes.south),
            show(axes.east),
            show(axes.west)
        );
    }
    Ok(())
}
