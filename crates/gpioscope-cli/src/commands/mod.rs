pub mod monitor;
pub mod scan;

use std::path::{Path, PathBuf};

use gpioscope_core::{SampleSource, ScopeConfig};

use crate::tui::app::AppError;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Options {
    pub config: PathBuf,
    pub simulate: bool,
    pub db_path: Option<PathBuf>,
}

/// Load the configuration file and apply command-line overrides.
pub fn load_config(opts: &Options) -> Result<ScopeConfig, AppError> {
    let mut config = ScopeConfig::load(&opts.config)?;
    if let Some(dir) = &opts.db_path {
        config.db_path = dir.clone();
    }
    log::info!(
        "config {}: {} channel(s), expander {}",
        opts.config.display(),
        config.channels.len(),
        match config.expander {
            Some(exp) => format!("bus {} address {:#04x}", exp.bus, exp.address),
            None => "disabled".to_string(),
        }
    );
    Ok(config)
}

/// Acquire the input lines, real or simulated.
pub fn open_lines(config: &ScopeConfig, simulate: bool) -> Result<SampleSource, AppError> {
    if simulate {
        log::info!("simulated input lines");
        return Ok(SampleSource::simulated(config));
    }
    Ok(SampleSource::open(config)?)
}

/// Route `log` output to `path`; the terminal belongs to the dashboard.
pub fn init_diagnostics(path: &Path) {
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("Warning: diagnostics disabled, cannot open {}: {e}", path.display()),
    }
}
