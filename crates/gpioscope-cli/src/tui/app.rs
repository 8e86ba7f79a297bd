//! The control loop.
//!
//! One [`App::tick`] is one full pass through the eight [`Phase`]s: input,
//! dispatch, sample, update, log, layout, paint, sleep. The loop is single
//! threaded; the only cross-thread state is the interrupt flag set by the
//! SIGINT handler, which is checked before every phase and during the sleep.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gpioscope_core::{
    ChannelHistoryStore, Command, CommandProcessor, ConfigError, Outcome, RecordSink, SampleSource,
    ScopeConfig, SessionState, SourceError, TrajectoryPoint, TrajectoryTracker, records_for_tick,
};
use ratatui::prelude::*;
use thiserror::Error;

use super::layout::PanelLayout;
use super::picker::{DestinationPicker, PickerEvent};
use super::ui::{self, View};

/// Longest single sleep between interrupt checks.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Keys drained per tick; anything beyond waits for the next tick.
const MAX_KEYS_PER_TICK: usize = 32;

// ---------------------------------------------------------------------------
// Phases and outcomes
// ---------------------------------------------------------------------------

/// Steps of one tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Input,
    Dispatch,
    Sample,
    Update,
    Log,
    Layout,
    Paint,
    Sleep,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Input,
        Phase::Dispatch,
        Phase::Sample,
        Phase::Update,
        Phase::Log,
        Phase::Layout,
        Phase::Paint,
        Phase::Sleep,
    ];
}

/// How a tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The user asked to quit.
    Quit,
    /// The interrupt flag was raised.
    Interrupted,
}

/// Fatal errors of a monitoring session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("input lines: {0}")]
    Source(#[from] SourceError),

    #[error("terminal: {0}")]
    Io(#[from] io::Error),

    #[error("installing interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Non-blocking key source.
pub trait InputSource {
    /// Next pending key press, or `None` if nothing is waiting.
    fn poll_key(&mut self) -> io::Result<Option<KeyEvent>>;
}

/// Reads key presses from the controlling terminal.
pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn poll_key(&mut self) -> io::Result<Option<KeyEvent>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// The terminal plus the action that gives the console back.
///
/// The restore action runs exactly once: on [`Display::restore`] or on drop,
/// whichever comes first. The console itself is restored once even when a
/// panic hook and the drop both fire.
pub struct Display<B: Backend> {
    terminal: Terminal<B>,
    restore: Option<Box<dyn FnOnce() + Send>>,
}

impl Display<CrosstermBackend<Stdout>> {
    /// Switch the console to raw mode on the alternate screen.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(t) => t,
            Err(e) => {
                restore_console();
                return Err(e);
            }
        };

        // Restore the terminal before the panic message is printed. The hook
        // and the drop share one flag so the console is restored once.
        let restored = Arc::new(AtomicBool::new(false));
        let hook_restored = restored.clone();
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            run_once(&hook_restored, restore_console);
            original_hook(info);
        }));

        Ok(Self::new(
            terminal,
            Box::new(move || {
                if !std::thread::panicking() {
                    let _ = std::panic::take_hook();
                }
                run_once(&restored, restore_console);
            }),
        ))
    }
}

/// Run `action` unless `done` is already set. Returns whether it ran.
fn run_once(done: &AtomicBool, action: impl FnOnce()) -> bool {
    if done.swap(true, Ordering::SeqCst) {
        return false;
    }
    action();
    true
}

fn restore_console() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
}

impl<B: Backend> Display<B> {
    pub fn new(terminal: Terminal<B>, restore: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            terminal,
            restore: Some(restore),
        }
    }

    /// Current viewport.
    pub fn size(&self) -> io::Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn restore(&mut self) {
        if let Some(restore) = self.restore.take() {
            log::debug!("display: restoring console");
            restore();
        }
    }
}

impl<B: Backend> Drop for Display<B> {
    fn drop(&mut self) {
        self.restore();
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Handles acquired once at startup.
///
/// Acquired hardware first, then display, then log. Fields drop in
/// declaration order, so release runs log, display, hardware on every exit.
pub struct Resources<B: Backend> {
    pub log: Box<dyn RecordSink>,
    pub display: Display<B>,
    pub lines: SampleSource,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App<B: Backend> {
    config: ScopeConfig,
    state: SessionState,
    history: ChannelHistoryStore,
    tracker: TrajectoryTracker,
    layout: PanelLayout,
    picker: Option<DestinationPicker>,
    interrupt: Arc<AtomicBool>,
    observer: Option<Box<dyn FnMut(Phase)>>,
    last_log_error: Option<String>,
    res: Resources<B>,
}

impl<B: Backend> App<B> {
    pub fn new(config: ScopeConfig, res: Resources<B>, interrupt: Arc<AtomicBool>) -> Self {
        let state = SessionState::new(&config);
        let history = ChannelHistoryStore::new(&config.channels, state.history_length());
        let tracker = TrajectoryTracker::new(config.axes, config.scale);
        Self {
            config,
            state,
            history,
            tracker,
            layout: PanelLayout::default(),
            picker: None,
            interrupt,
            observer: None,
            last_log_error: None,
            res,
        }
    }

    /// Call `observer` as each phase starts.
    pub fn set_phase_observer(&mut self, observer: impl FnMut(Phase) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &ChannelHistoryStore {
        &self.history
    }

    pub fn tracker(&self) -> &TrajectoryTracker {
        &self.tracker
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn is_picking(&self) -> bool {
        self.picker.is_some()
    }

    pub fn last_log_error(&self) -> Option<&str> {
        self.last_log_error.as_deref()
    }

    pub fn display(&self) -> &Display<B> {
        &self.res.display
    }

    pub fn log_sink(&self) -> &dyn RecordSink {
        self.res.log.as_ref()
    }

    /// Tick until the user quits or the interrupt flag is raised.
    pub fn run(&mut self, input: &mut dyn InputSource) -> Result<TickOutcome, AppError> {
        log::info!(
            "monitoring {} channel(s) every {:?} via {}",
            self.config.channels.len(),
            self.state.polling_interval(),
            self.res.lines.reader_names().join(" + ")
        );
        loop {
            match self.tick(input)? {
                TickOutcome::Continue => {}
                outcome => {
                    log::info!(
                        "session ended ({outcome:?}) after {} tick(s), {} expander failure(s)",
                        self.res.lines.ticks(),
                        self.res.lines.expander_failures()
                    );
                    return Ok(outcome);
                }
            }
        }
    }

    /// Run one pass through every phase.
    pub fn tick(&mut self, input: &mut dyn InputSource) -> Result<TickOutcome, AppError> {
        if self.enter(Phase::Input) {
            return Ok(TickOutcome::Interrupted);
        }
        let mut keys = Vec::new();
        while keys.len() < MAX_KEYS_PER_TICK {
            match input.poll_key()? {
                Some(key) => keys.push(key),
                None => break,
            }
        }

        if self.enter(Phase::Dispatch) {
            return Ok(TickOutcome::Interrupted);
        }
        for key in keys {
            if self.dispatch(key) == TickOutcome::Quit {
                return Ok(TickOutcome::Quit);
            }
        }

        if self.enter(Phase::Sample) {
            return Ok(TickOutcome::Interrupted);
        }
        let samples = if self.state.is_paused() {
            None
        } else {
            Some(self.res.lines.sample(&self.config.channels)?)
        };

        if self.enter(Phase::Update) {
            return Ok(TickOutcome::Interrupted);
        }
        if let Some(samples) = &samples {
            self.history.append_tick(samples);
            if self.state.trajectory_visible() {
                let center = self.trajectory_center()?;
                self.tracker.track(&self.history.snapshot(), center);
            }
        }

        if self.enter(Phase::Log) {
            return Ok(TickOutcome::Interrupted);
        }
        if samples.is_some() && self.state.is_logging() {
            self.emit_records();
        }

        if self.enter(Phase::Layout) {
            return Ok(TickOutcome::Interrupted);
        }
        let viewport = self.res.display.size()?;
        if self.layout.recompute(viewport, self.state.trajectory_visible()) {
            log::debug!("layout: {}x{}", viewport.width, viewport.height);
        }

        if self.enter(Phase::Paint) {
            return Ok(TickOutcome::Interrupted);
        }
        if !self.layout.is_degenerate() {
            self.paint()?;
        }

        if self.enter(Phase::Sleep) || self.sleep() {
            return Ok(TickOutcome::Interrupted);
        }
        Ok(TickOutcome::Continue)
    }

    /// Notify the observer and report whether the interrupt flag is set.
    fn enter(&mut self, phase: Phase) -> bool {
        if let Some(observer) = self.observer.as_mut() {
            observer(phase);
        }
        self.interrupt.load(Ordering::SeqCst)
    }

    fn dispatch(&mut self, key: KeyEvent) -> TickOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            // Raw mode swallows SIGINT; treat the key the same way.
            self.interrupt.store(true, Ordering::SeqCst);
            return TickOutcome::Continue;
        }

        let command = match self.picker.as_mut() {
            Some(picker) => match picker.handle_key(key.code) {
                PickerEvent::Editing => return TickOutcome::Continue,
                PickerEvent::Cancelled => {
                    self.picker = None;
                    return TickOutcome::Continue;
                }
                PickerEvent::Confirmed(dir) => {
                    self.picker = None;
                    Command::SetDestination(dir)
                }
            },
            None => match key.code {
                KeyCode::Esc => Command::Quit,
                KeyCode::Char(c) => match Command::from_key(c) {
                    Some(command) => command,
                    None => return TickOutcome::Continue,
                },
                _ => return TickOutcome::Continue,
            },
        };

        match CommandProcessor::apply(&mut self.state, &mut self.history, command, Instant::now()) {
            Outcome::Continue => {}
            Outcome::OpenPicker => {
                self.picker = Some(DestinationPicker::new(self.res.log.destination()));
            }
            Outcome::SwitchLog(dir) => match self.res.log.switch_to(&dir) {
                Ok(()) => {
                    log::info!("record log: switched to {}", dir.display());
                    self.last_log_error = None;
                }
                Err(e) => {
                    log::warn!("record log: cannot switch to {}: {e}", dir.display());
                    self.last_log_error = Some(format!("{}: {e}", dir.display()));
                }
            },
            Outcome::Quit => return TickOutcome::Quit,
        }
        TickOutcome::Continue
    }

    /// Centre of the trajectory panel for the current viewport.
    fn trajectory_center(&self) -> io::Result<TrajectoryPoint> {
        let (_, _, area) = PanelLayout::split(self.res.display.size()?, true);
        Ok(ui::trajectory_center(area.unwrap_or_default()))
    }

    fn emit_records(&mut self) {
        let records = records_for_tick(
            &self.config.channels,
            &self.history.snapshot(),
            &Local::now(),
        );
        match self.res.log.append(&records) {
            Ok(()) => self.last_log_error = None,
            Err(e) => {
                log::warn!("record log: dropped {} record(s): {e}", records.len());
                self.last_log_error = Some(e.to_string());
            }
        }
    }

    fn paint(&mut self) -> io::Result<()> {
        let view = View {
            config: &self.config,
            state: &self.state,
            history: self.history.snapshot(),
            tracker: &self.tracker,
            layout: &self.layout,
            picker: self.picker.as_ref(),
            log_destination: self.res.log.destination(),
            log_records: self.res.log.total_records(),
            log_error: self.last_log_error.as_deref(),
            now: Instant::now(),
        };
        self.res.display.terminal.draw(|f| ui::draw(f, &view))?;
        Ok(())
    }

    /// Sleep one polling interval. Returns `true` if interrupted.
    fn sleep(&self) -> bool {
        let deadline = Instant::now() + self.state.polling_interval();
        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                return true;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpioscope_core::{ChannelId, LineReader, LogRecord, ReaderInfo, ReaderKind};
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    type Releases = Arc<Mutex<Vec<&'static str>>>;

    /// Scripted key source: each `None` ends the keys delivered in one tick.
    #[derive(Debug, Default)]
    struct ScriptedInput {
        keys: VecDeque<Option<KeyEvent>>,
    }

    impl ScriptedInput {
        /// One tick's worth of plain key presses.
        fn push_tick(&mut self, keys: &str) {
            self.keys
                .extend(keys.chars().map(|c| Some(KeyEvent::from(KeyCode::Char(c)))));
            self.keys.push_back(None);
        }

        fn push_key(&mut self, key: KeyEvent) {
            self.keys.push_back(Some(key));
        }

        /// End the current tick's keys.
        fn end_tick(&mut self) {
            self.keys.push_back(None);
        }
    }

    impl InputSource for ScriptedInput {
        fn poll_key(&mut self) -> io::Result<Option<KeyEvent>> {
            Ok(self.keys.pop_front().flatten())
        }
    }

    static FLIP_INFO: ReaderInfo = ReaderInfo {
        name: "flip",
        description: "lines that flip every read",
        kind: ReaderKind::Simulated,
    };

    /// Every line flips on each read; optionally fails.
    struct FlipLines {
        value: bool,
        fail: bool,
        releases: Releases,
    }

    impl LineReader for FlipLines {
        fn info(&self) -> &ReaderInfo {
            &FLIP_INFO
        }

        fn read(&mut self, line: u32) -> Result<bool, SourceError> {
            if self.fail {
                return Err(SourceError::InvalidValue {
                    line,
                    value: "x".into(),
                });
            }
            self.value = !self.value;
            Ok(self.value)
        }
    }

    impl Drop for FlipLines {
        fn drop(&mut self) {
            self.releases.lock().unwrap().push("hardware");
        }
    }

    /// In-memory record sink.
    struct MemorySink {
        dir: PathBuf,
        records: Arc<Mutex<Vec<LogRecord>>>,
        fail_appends: bool,
        releases: Releases,
    }

    impl RecordSink for MemorySink {
        fn append(&mut self, records: &[LogRecord]) -> io::Result<()> {
            if self.fail_appends {
                return Err(io::Error::other("disk full"));
            }
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(())
        }

        fn destination(&self) -> &Path {
            &self.dir
        }

        fn switch_to(&mut self, dir: &Path) -> io::Result<()> {
            if dir.starts_with("/nonexistent") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
            }
            self.dir = dir.to_path_buf();
            Ok(())
        }

        fn total_records(&self) -> u64 {
            self.records.lock().unwrap().len() as u64
        }
    }

    impl Drop for MemorySink {
        fn drop(&mut self) {
            self.releases.lock().unwrap().push("log");
        }
    }

    struct Harness {
        app: App<TestBackend>,
        interrupt: Arc<AtomicBool>,
        releases: Releases,
        records: Arc<Mutex<Vec<LogRecord>>>,
    }

    fn harness_with(config: &str, fail_reads: bool, fail_appends: bool) -> Harness {
        let config = ScopeConfig::parse(config).unwrap();
        let releases: Releases = Arc::default();
        let records = Arc::default();

        let lines = SampleSource::new(
            Box::new(FlipLines {
                value: false,
                fail: fail_reads,
                releases: releases.clone(),
            }),
            None,
        );
        let display_releases = releases.clone();
        let display = Display::new(
            Terminal::new(TestBackend::new(80, 24)).unwrap(),
            Box::new(move || display_releases.lock().unwrap().push("display")),
        );
        let log = Box::new(MemorySink {
            dir: PathBuf::from("logs"),
            records: Arc::clone(&records),
            fail_appends,
            releases: releases.clone(),
        });

        let interrupt = Arc::new(AtomicBool::new(false));
        let app = App::new(
            config,
            Resources {
                log,
                display,
                lines,
            },
            interrupt.clone(),
        );
        Harness {
            app,
            interrupt,
            releases,
            records,
        }
    }

    fn harness(config: &str) -> Harness {
        harness_with(config, false, false)
    }

    const TWO_AXES: &str = "polling_speed:0.01\nhistory_length:5\n17:Door\n27:Button\nnorth:17\neast:27\n";

    fn history_of(app: &App<TestBackend>) -> Vec<(ChannelId, Vec<bool>)> {
        app.history()
            .snapshot()
            .iter()
            .map(|(id, s)| (id, s.iter().copied().collect()))
            .collect()
    }

    fn screen(app: &App<TestBackend>) -> String {
        let buf = app.display().backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn running_ticks_sample_and_log() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("l");
        for _ in 0..3 {
            assert_eq!(h.app.tick(&mut input).unwrap(), TickOutcome::Continue);
        }
        // Two channels, three logged ticks.
        assert_eq!(h.records.lock().unwrap().len(), 6);
        assert!(h.app.history().latest(ChannelId(17)) || h.app.history().latest(ChannelId(27)));
        assert!(screen(&h.app).contains("LOGGING<l>"));
    }

    #[test]
    fn paused_ticks_leave_buffers_path_and_log_untouched() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("lv");
        input.push_tick("");
        input.push_tick("p");
        for _ in 0..3 {
            h.app.tick(&mut input).unwrap();
        }
        assert!(h.app.state().is_paused());

        let history = history_of(&h.app);
        let path: Vec<_> = h.app.tracker().path().collect();
        let logged = h.records.lock().unwrap().len();
        assert_eq!(logged, 4);

        for _ in 0..5 {
            assert_eq!(h.app.tick(&mut input).unwrap(), TickOutcome::Continue);
        }
        assert_eq!(history_of(&h.app), history);
        assert_eq!(h.app.tracker().path().collect::<Vec<_>>(), path);
        assert_eq!(h.records.lock().unwrap().len(), logged);

        let buf = h.app.display().backend().buffer();
        let x = (0..80).find(|&x| buf[(x, 2)].symbol() == "P").unwrap();
        assert_eq!(buf[(x, 2)].bg, Color::Red);
    }

    #[test]
    fn interrupt_at_every_phase_releases_each_handle_once() {
        for target in Phase::ALL {
            let Harness {
                mut app,
                interrupt,
                releases,
                ..
            } = harness(TWO_AXES);
            let flag = interrupt.clone();
            app.set_phase_observer(move |phase| {
                if phase == target {
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let mut input = ScriptedInput::default();
            input.push_tick("lv");
            assert_eq!(app.run(&mut input).unwrap(), TickOutcome::Interrupted);
            assert!(releases.lock().unwrap().is_empty(), "released early at {target:?}");
            drop(app);

            assert_eq!(
                *releases.lock().unwrap(),
                vec!["log", "display", "hardware"],
                "interrupted at {target:?}"
            );
        }
    }

    #[test]
    fn interrupt_during_sleep_is_observed_promptly() {
        let mut h = harness("polling_speed:2.0\n17:Door\n");
        let mut input = ScriptedInput::default();
        assert_eq!(h.app.state().polling_interval(), Duration::from_secs(2));

        let flag = h.interrupt.clone();
        let setter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });
        let start = Instant::now();
        assert_eq!(h.app.tick(&mut input).unwrap(), TickOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(1));
        setter.join().unwrap();
    }

    #[test]
    fn ctrl_c_key_interrupts() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        input.end_tick();
        assert_eq!(h.app.run(&mut input).unwrap(), TickOutcome::Interrupted);
        assert!(h.interrupt.load(Ordering::SeqCst));
    }

    #[test]
    fn quit_key_ends_run() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("");
        input.push_tick("q");
        assert_eq!(h.app.run(&mut input).unwrap(), TickOutcome::Quit);
        drop(h.app);
        assert_eq!(h.releases.lock().unwrap().len(), 3);
    }

    #[test]
    fn primary_read_failure_is_fatal_and_releases_once() {
        let Harness { mut app, releases, .. } = harness_with(TWO_AXES, true, false);
        let mut input = ScriptedInput::default();
        let err = app.run(&mut input).unwrap_err();
        assert!(matches!(err, AppError::Source(_)));
        drop(app);
        assert_eq!(*releases.lock().unwrap(), vec!["log", "display", "hardware"]);
    }

    #[test]
    fn log_failure_is_recoverable() {
        let mut h = harness_with(TWO_AXES, false, true);
        let mut input = ScriptedInput::default();
        input.push_tick("l");
        for _ in 0..3 {
            assert_eq!(h.app.tick(&mut input).unwrap(), TickOutcome::Continue);
        }
        assert_eq!(h.app.last_log_error(), Some("disk full"));
        assert!(screen(&h.app).contains("log error: disk full"));
    }

    #[test]
    fn history_keys_resize_every_buffer() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("]]]");
        h.app.tick(&mut input).unwrap();
        assert_eq!(h.app.state().history_length(), 8);
        for (_, samples) in history_of(&h.app) {
            assert_eq!(samples.len(), 8);
        }

        input.push_tick("[[[[[[[[[[[[");
        h.app.tick(&mut input).unwrap();
        assert_eq!(h.app.state().history_length(), 1);
        for (_, samples) in history_of(&h.app) {
            assert_eq!(samples.len(), 1);
        }
    }

    #[test]
    fn trajectory_toggle_changes_layout() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("");
        h.app.tick(&mut input).unwrap();
        assert_eq!(h.app.layout().trajectory, None);
        assert_eq!(h.app.layout().main.width, 80);

        input.push_tick("v");
        h.app.tick(&mut input).unwrap();
        assert_eq!(h.app.layout().main.width, 40);
        assert!(h.app.layout().trajectory.is_some());
        assert_eq!(h.app.tracker().path_len(), 1);
        assert!(screen(&h.app).contains("Trajectory"));
        assert!(screen(&h.app).contains('O'));
    }

    #[test]
    fn picker_switches_log_destination() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("s");
        h.app.tick(&mut input).unwrap();
        assert!(h.app.is_picking());
        assert!(screen(&h.app).contains("Log destination"));

        // While the prompt is open, command keys are text.
        for _ in 0.."logs".len() {
            input.push_key(KeyEvent::from(KeyCode::Backspace));
        }
        input.push_tick("archivep");
        h.app.tick(&mut input).unwrap();
        assert!(!h.app.state().is_paused());

        input.push_key(KeyEvent::from(KeyCode::Enter));
        input.end_tick();
        h.app.tick(&mut input).unwrap();
        assert!(!h.app.is_picking());
        assert_eq!(h.app.log_sink().destination(), Path::new("archivep"));
    }

    #[test]
    fn failed_switch_keeps_log_and_reports() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("s");
        h.app.tick(&mut input).unwrap();
        for _ in 0.."logs".len() {
            input.push_key(KeyEvent::from(KeyCode::Backspace));
        }
        for c in "/nonexistent/x".chars() {
            input.push_key(KeyEvent::from(KeyCode::Char(c)));
        }
        input.push_key(KeyEvent::from(KeyCode::Enter));
        input.end_tick();
        h.app.tick(&mut input).unwrap();

        assert_eq!(h.app.log_sink().destination(), Path::new("logs"));
        assert!(h.app.last_log_error().is_some());
    }

    #[test]
    fn degenerate_viewport_skips_painting() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        h.app.res.display.terminal.backend_mut().resize(0, 0);
        input.push_tick("");
        assert_eq!(h.app.tick(&mut input).unwrap(), TickOutcome::Continue);
        assert!(h.app.layout().is_degenerate());
    }

    #[test]
    fn restore_action_runs_once() {
        let done = AtomicBool::new(false);
        let mut runs = 0;
        assert!(run_once(&done, || runs += 1));
        assert!(!run_once(&done, || runs += 1));
        assert_eq!(runs, 1);
    }

    #[test]
    fn path_survives_hiding_the_panel() {
        let mut h = harness(TWO_AXES);
        let mut input = ScriptedInput::default();
        input.push_tick("v");
        h.app.tick(&mut input).unwrap();
        let first: Vec<_> = h.app.tracker().path().collect();
        assert_eq!(first.len(), 1);

        input.push_tick("v");
        h.app.tick(&mut input).unwrap();
        assert!(!h.app.state().trajectory_visible());
        assert_eq!(h.app.tracker().path().collect::<Vec<_>>(), first);

        input.push_tick("v");
        h.app.tick(&mut input).unwrap();
        assert!(h.app.state().trajectory_visible());
        let path: Vec<_> = h.app.tracker().path().collect();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0], first[0]);
    }

    #[test]
    fn trajectory_centre_follows_resize() {
        let mut h = harness("polling_speed:0.01\n17:Door\n");
        let mut input = ScriptedInput::default();
        input.push_tick("v");
        h.app.tick(&mut input).unwrap();
        // 80x24: panel (40, 4, 40, 20).
        assert_eq!(h.app.tracker().current(), Some(TrajectoryPoint::new(10, 20)));

        h.app.res.display.terminal.backend_mut().resize(120, 40);
        input.push_tick("");
        h.app.tick(&mut input).unwrap();
        // 120x40: panel (60, 4, 60, 36).
        assert_eq!(h.app.tracker().current(), Some(TrajectoryPoint::new(18, 30)));
        assert_eq!(h.app.layout().trajectory, Some(Rect::new(60, 4, 60, 36)));
    }
}
