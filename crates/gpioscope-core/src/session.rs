//! Interactive session state and the commands that change it.
//!
//! [`SessionState`] is owned by the control loop and only mutated through
//! [`CommandProcessor::apply`]. History-length commands resize every channel
//! buffer in the same call, so the store never disagrees with the state.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{MIN_POLLING_INTERVAL, ScopeConfig};
use crate::history::ChannelHistoryStore;

/// Interval change applied by one `-` or `+` press.
pub const POLLING_STEP: Duration = Duration::from_millis(10);

/// How long a rate/length label stays highlighted after its key is pressed.
pub const FLASH_DURATION: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Flash groups
// ---------------------------------------------------------------------------

/// Header label groups that flash when their control is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashGroup {
    IntervalDown,
    IntervalUp,
    HistoryDown,
    HistoryUp,
}

const FLASH_GROUPS: usize = 4;

impl FlashGroup {
    fn index(self) -> usize {
        match self {
            Self::IntervalDown => 0,
            Self::IntervalUp => 1,
            Self::HistoryDown => 2,
            Self::HistoryUp => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Runtime-mutable state of a monitoring session.
#[derive(Debug, Clone)]
pub struct SessionState {
    paused: bool,
    logging_enabled: bool,
    trajectory_visible: bool,
    polling_interval: Duration,
    history_length: usize,
    flashes: [Option<Instant>; FLASH_GROUPS],
}

impl SessionState {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            paused: false,
            logging_enabled: false,
            trajectory_visible: false,
            polling_interval: config.polling_interval.max(MIN_POLLING_INTERVAL),
            history_length: config.history_length.max(1),
            flashes: [None; FLASH_GROUPS],
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_logging(&self) -> bool {
        self.logging_enabled
    }

    pub fn trajectory_visible(&self) -> bool {
        self.trajectory_visible
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Whether `group` was pressed less than [`FLASH_DURATION`] before `now`.
    pub fn is_flashing(&self, group: FlashGroup, now: Instant) -> bool {
        self.flashes[group.index()]
            .is_some_and(|at| now.saturating_duration_since(at) < FLASH_DURATION)
    }

    fn flash(&mut self, group: FlashGroup, now: Instant) {
        self.flashes[group.index()] = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Discrete user commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    ToggleLogging,
    ToggleTrajectory,
    /// Shorten the tick interval.
    DecreaseInterval,
    /// Lengthen the tick interval.
    IncreaseInterval,
    ShrinkHistory,
    GrowHistory,
    /// Open the log destination picker.
    PickDestination,
    /// Switch the log to a confirmed destination directory.
    SetDestination(PathBuf),
    Quit,
}

impl Command {
    /// Map a key press to its command.
    pub fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'p' => Self::TogglePause,
            'l' => Self::ToggleLogging,
            'v' => Self::ToggleTrajectory,
            '-' => Self::DecreaseInterval,
            '+' | '=' => Self::IncreaseInterval,
            '[' => Self::ShrinkHistory,
            ']' => Self::GrowHistory,
            's' => Self::PickDestination,
            'q' => Self::Quit,
            _ => return None,
        })
    }
}

/// What the control loop must do after a command was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    OpenPicker,
    SwitchLog(PathBuf),
    Quit,
}

/// Applies commands to the session state and the history buffers.
pub struct CommandProcessor;

impl CommandProcessor {
    pub fn apply(
        state: &mut SessionState,
        history: &mut ChannelHistoryStore,
        command: Command,
        now: Instant,
    ) -> Outcome {
        match command {
            Command::TogglePause => state.paused = !state.paused,
            Command::ToggleLogging => state.logging_enabled = !state.logging_enabled,
            Command::ToggleTrajectory => state.trajectory_visible = !state.trajectory_visible,
            Command::DecreaseInterval => {
                state.polling_interval = state
                    .polling_interval
                    .saturating_sub(POLLING_STEP)
                    .max(MIN_POLLING_INTERVAL);
                state.flash(FlashGroup::IntervalDown, now);
            }
            Command::IncreaseInterval => {
                state.polling_interval = state.polling_interval.saturating_add(POLLING_STEP);
                state.flash(FlashGroup::IntervalUp, now);
            }
            Command::ShrinkHistory => {
                if state.history_length > 1 && history.resize(state.history_length - 1) {
                    state.history_length -= 1;
                }
                state.flash(FlashGroup::HistoryDown, now);
            }
            Command::GrowHistory => {
                let grown = state.history_length.saturating_add(1);
                if history.resize(grown) {
                    state.history_length = grown;
                }
                state.flash(FlashGroup::HistoryUp, now);
            }
            Command::PickDestination => return Outcome::OpenPicker,
            Command::SetDestination(dir) => return Outcome::SwitchLog(dir),
            Command::Quit => return Outcome::Quit,
        }
        Outcome::Continue
    }
}
