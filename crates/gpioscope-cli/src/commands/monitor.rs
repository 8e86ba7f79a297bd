use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gpioscope_core::JsonlLog;

use super::Options;
use crate::tui::app::{App, AppError, CrosstermInput, Display, Resources};

pub fn run(opts: &Options) -> Result<(), AppError> {
    let config = super::load_config(opts)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    // Hardware, then display, then log. Anything acquired before a failure
    // is released on the way out.
    let lines = super::open_lines(&config, opts.simulate)?;
    let display = Display::enter()?;
    let log = JsonlLog::open(&config.db_path)?;

    let mut app = App::new(
        config,
        Resources {
            log: Box::new(log),
            display,
            lines,
        },
        interrupt,
    );
    app.run(&mut CrosstermInput)?;
    Ok(())
}
