//! CLI for gpioscope: a live terminal strip-chart for digital input lines.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gpioscope")]
#[command(about = "gpioscope: live terminal strip-chart for digital input lines")]
#[command(version = gpioscope_core::VERSION)]
struct Cli {
    /// Configuration file (key:value lines)
    #[arg(long, global = true, default_value = "config.txt")]
    config: PathBuf,

    /// Use simulated lines instead of GPIO hardware
    #[arg(long, global = true)]
    simulate: bool,

    /// Log destination directory (overrides db_path from the config file)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Diagnostics file; RUST_LOG sets the level
    #[arg(long, global = true, default_value = "gpioscope.log")]
    diag_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard (default)
    Monitor,

    /// Print configured channels and read each one once
    Scan,
}

fn main() {
    let cli = Cli::parse();
    commands::init_diagnostics(&cli.diag_file);

    let opts = commands::Options {
        config: cli.config,
        simulate: cli.simulate,
        db_path: cli.db_path,
    };

    let result = match cli.command.unwrap_or(Commands::Monitor) {
        Commands::Monitor => commands::monitor::run(&opts),
        Commands::Scan => commands::scan::run(&opts),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
