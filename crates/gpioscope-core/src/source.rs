//! Digital input reader trait.
//!
//! Every hardware bank implements [`LineReader`], which provides metadata via
//! [`ReaderInfo`] and one boolean per line. Handles are acquired by the
//! reader's constructor and released in its `Drop`.

use std::path::PathBuf;

use thiserror::Error;

/// Kind of bank a reader serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderKind {
    /// Directly attached lines; read failures are fatal.
    Primary,
    /// Bus-attached expander; read failures degrade to all-low.
    Expander,
    /// Synthetic lines for running without hardware.
    Simulated,
}

impl std::fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Expander => write!(f, "expander"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// Metadata about a line reader.
#[derive(Debug, Clone)]
pub struct ReaderInfo {
    /// Unique identifier (e.g. `"sysfs_gpio"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    pub kind: ReaderKind,
}

/// Errors raised while acquiring or reading input lines.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("line {line}: {op} {path}: {source}")]
    Io {
        line: u32,
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: unexpected value {value:?}")]
    InvalidValue { line: u32, value: String },

    #[error("line {line} is not provided by {reader}")]
    UnknownLine { line: u32, reader: &'static str },

    #[error("i2c bus {bus} address {address:#04x}: {source}")]
    Bus {
        bus: u8,
        address: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Trait that every input bank must implement.
pub trait LineReader: Send {
    /// Reader metadata.
    fn info(&self) -> &ReaderInfo;

    /// Called once per tick before any `read`. Readers that fetch all lines in
    /// one bus transaction do it here.
    fn begin_tick(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Current state of one line.
    fn read(&mut self, line: u32) -> Result<bool, SourceError>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}
