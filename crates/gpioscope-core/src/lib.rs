//! # gpioscope-core
//!
//! **A logic-level strip-chart for the terminal.**
//!
//! `gpioscope-core` holds everything the live dashboard needs apart from the
//! terminal itself: rolling per-channel history, the trajectory tracker that
//! turns four lines into a 2D cursor, the session commands, the hardware
//! readers, and the structured sample log.
//!
//! ## Quick Start
//!
//! ```
//! use gpioscope_core::{ChannelHistoryStore, ScopeConfig};
//!
//! let config = ScopeConfig::parse("17:Door\n27:Window\nhistory_length:4").unwrap();
//! let mut history = ChannelHistoryStore::new(&config.channels, config.history_length);
//!
//! history.append_tick(&[(config.channels[0].id, true), (config.channels[1].id, false)]);
//! assert!(history.latest(config.channels[0].id));
//! ```
//!
//! ## Architecture
//!
//! Readers → SampleSource → ChannelHistoryStore → (TrajectoryTracker, RecordSink) → painters
//!
//! Every hardware bank implements the [`LineReader`] trait. [`SampleSource`]
//! reads the primary lines and the optional expander group once per tick.

pub mod channel;
pub mod config;
pub mod history;
pub mod record;
pub mod sampler;
pub mod session;
pub mod source;
pub mod sources;
pub mod trajectory;

pub use channel::{Bank, Channel, ChannelId, EXPANDER_BASE_ID, EXPANDER_LINES};
pub use config::{ConfigError, ExpanderConfig, MIN_POLLING_INTERVAL, ScopeConfig};
pub use history::{ChannelHistoryStore, HistorySnapshot};
pub use record::{JsonlLog, LogRecord, RecordSink, records_for_tick};
pub use sampler::SampleSource;
pub use session::{
    Command, CommandProcessor, FLASH_DURATION, FlashGroup, Outcome, POLLING_STEP, SessionState,
};
pub use source::{LineReader, ReaderInfo, ReaderKind, SourceError};
pub use trajectory::{
    AxisSample, Glyph, MAX_SCALE, PATH_CAPACITY, PaintCell, TrajectoryAxes, TrajectoryPoint,
    TrajectoryTracker, rasterize_segment,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
