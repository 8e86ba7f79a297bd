//! Structured sample log.
//!
//! While logging is enabled the control loop appends one [`LogRecord`] per
//! monitored channel per tick. The default sink, [`JsonlLog`], keeps an
//! append-only JSON Lines file per host inside the chosen destination
//! directory:
//!
//! ```text
//! <destination>/<hostname>_gpio_log.jsonl
//! {"label":"Door","value":1,"timestamp":"2026-02-15 01:30:00.123456"}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::history::HistorySnapshot;

/// Timestamp layout with microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One logged sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub label: String,
    pub value: u8,
    pub timestamp: String,
}

/// Format a timestamp the way records store it.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One record per channel from the newest sample, all sharing `at`.
pub fn records_for_tick(
    channels: &[Channel],
    history: &HistorySnapshot<'_>,
    at: &DateTime<Local>,
) -> Vec<LogRecord> {
    let timestamp = format_timestamp(at);
    channels
        .iter()
        .map(|c| LogRecord {
            label: c.label.clone(),
            value: u8::from(history.latest(c.id)),
            timestamp: timestamp.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sink trait
// ---------------------------------------------------------------------------

/// Append-only record store.
pub trait RecordSink {
    /// Append a batch of records.
    fn append(&mut self, records: &[LogRecord]) -> io::Result<()>;

    /// Directory records currently go to.
    fn destination(&self) -> &Path;

    /// Move future records to `dir`. On failure the current target is kept.
    fn switch_to(&mut self, dir: &Path) -> io::Result<()>;

    /// Records appended since the sink was opened.
    fn total_records(&self) -> u64;
}

// ---------------------------------------------------------------------------
// JSON Lines sink
// ---------------------------------------------------------------------------

/// Best-effort host name for the log file name.
pub fn hostname() -> String {
    let mut buf = [0u8; 256];
    // SAFETY: buf is a valid writable buffer of the given length.
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if ret != 0 {
        return "localhost".to_string();
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).trim().to_string();
    if name.is_empty() {
        "localhost".to_string()
    } else {
        name
    }
}

/// File name used inside a destination directory.
pub fn log_file_name(host: &str) -> String {
    format!("{host}_gpio_log.jsonl")
}

/// Append-only JSON Lines log file.
pub struct JsonlLog {
    destination: PathBuf,
    file_path: PathBuf,
    host: String,
    writer: BufWriter<File>,
    total_records: u64,
}

impl JsonlLog {
    /// Open (creating if needed) the log inside `dir`.
    pub fn open(dir: &Path) -> io::Result<Self> {
        Self::open_for_host(dir, &hostname())
    }

    pub fn open_for_host(dir: &Path, host: &str) -> io::Result<Self> {
        let (file_path, writer) = open_log_file(dir, host)?;
        log::info!("record log: writing to {}", file_path.display());
        Ok(Self {
            destination: dir.to_path_buf(),
            file_path,
            host: host.to_string(),
            writer,
            total_records: 0,
        })
    }

    /// Full path of the active log file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn open_log_file(dir: &Path, host: &str) -> io::Result<(PathBuf, BufWriter<File>)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(host));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, BufWriter::new(file)))
}

impl RecordSink for JsonlLog {
    fn append(&mut self, records: &[LogRecord]) -> io::Result<()> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        self.total_records += records.len() as u64;
        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.destination
    }

    fn switch_to(&mut self, dir: &Path) -> io::Result<()> {
        let (file_path, writer) = open_log_file(dir, &self.host)?;
        if let Err(e) = self.writer.flush() {
            log::warn!("record log: flushing {} failed: {e}", self.file_path.display());
        }
        log::info!(
            "record log: switched {} -> {}",
            self.file_path.display(),
            file_path.display()
        );
        self.writer = writer;
        self.file_path = file_path;
        self.destination = dir.to_path_buf();
        Ok(())
    }

    fn total_records(&self) -> u64 {
        self.total_records
    }
}

impl Drop for JsonlLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("record log: final flush failed: {e}");
        }
        log::debug!(
            "record log: closed {} after {} record(s)",
            self.file_path.display(),
            self.total_records
        );
    }
}
