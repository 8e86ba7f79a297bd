//! SysfsGpio: primary lines through the Linux sysfs GPIO interface.
//!
//! Each line is exported (unless something else already did), switched to
//! input, and read from `gpio<N>/value`. Lines exported here are unexported
//! again on drop.

use std::fs;
use std::path::{Path, PathBuf};

use crate::source::{LineReader, ReaderInfo, ReaderKind, SourceError};

/// Default sysfs GPIO root.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

static SYSFS_INFO: ReaderInfo = ReaderInfo {
    name: "sysfs_gpio",
    description: "Directly attached digital inputs via /sys/class/gpio",
    kind: ReaderKind::Primary,
};

/// Primary line reader backed by sysfs.
pub struct SysfsGpio {
    root: PathBuf,
    lines: Vec<u32>,
    /// Lines this reader exported and must unexport.
    exported: Vec<u32>,
}

impl SysfsGpio {
    /// Acquire `lines` under the default sysfs root.
    pub fn open(lines: &[u32]) -> Result<Self, SourceError> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), lines)
    }

    /// Acquire `lines` under an explicit root.
    pub fn open_at(root: &Path, lines: &[u32]) -> Result<Self, SourceError> {
        let mut reader = Self {
            root: root.to_path_buf(),
            lines: lines.to_vec(),
            exported: Vec::new(),
        };
        for &line in lines {
            // On error `reader` drops here and releases what was exported so far.
            reader.acquire(line)?;
        }
        log::info!("sysfs gpio: acquired {} line(s) under {}", lines.len(), root.display());
        Ok(reader)
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{line}"))
    }

    fn acquire(&mut self, line: u32) -> Result<(), SourceError> {
        if !self.line_dir(line).exists() {
            let export = self.root.join("export");
            fs::write(&export, line.to_string()).map_err(|source| SourceError::Io {
                line,
                op: "export",
                path: export.clone(),
                source,
            })?;
            self.exported.push(line);
        }
        let direction = self.line_dir(line).join("direction");
        fs::write(&direction, "in").map_err(|source| SourceError::Io {
            line,
            op: "set direction",
            path: direction.clone(),
            source,
        })
    }
}

impl LineReader for SysfsGpio {
    fn info(&self) -> &ReaderInfo {
        &SYSFS_INFO
    }

    fn read(&mut self, line: u32) -> Result<bool, SourceError> {
        if !self.lines.contains(&line) {
            return Err(SourceError::UnknownLine {
                line,
                reader: SYSFS_INFO.name,
            });
        }
        let path = self.line_dir(line).join("value");
        let raw = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            line,
            op: "read",
            path: path.clone(),
            source,
        })?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(SourceError::InvalidValue {
                line,
                value: other.to_string(),
            }),
        }
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        let unexport = self.root.join("unexport");
        for line in self.exported.drain(..) {
            if let Err(e) = fs::write(&unexport, line.to_string()) {
                log::warn!("sysfs gpio: failed to unexport line {line}: {e}");
            }
        }
        log::debug!("sysfs gpio: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_line(root: &Path, line: u32, value: &str) {
        let dir = root.join(format!("gpio{line}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("value"), value).unwrap();
    }

    #[test]
    fn reads_values_and_sets_direction() {
        let tmp = tempfile::tempdir().unwrap();
        fake_line(tmp.path(), 17, "1\n");
        fake_line(tmp.path(), 27, "0\n");

        let mut gpio = SysfsGpio::open_at(tmp.path(), &[17, 27]).unwrap();
        assert!(gpio.read(17).unwrap());
        assert!(!gpio.read(27).unwrap());
        let direction = fs::read_to_string(tmp.path().join("gpio17/direction")).unwrap();
        assert_eq!(direction, "in");
    }

    #[test]
    fn pre_exported_lines_are_not_unexported() {
        let tmp = tempfile::tempdir().unwrap();
        fake_line(tmp.path(), 5, "0");
        drop(SysfsGpio::open_at(tmp.path(), &[5]).unwrap());
        assert!(!tmp.path().join("unexport").exists());
    }

    #[test]
    fn export_without_kernel_fails_and_releases() {
        let tmp = tempfile::tempdir().unwrap();
        // The export write succeeds on a plain directory but no gpio dir appears,
        // so setting the direction fails.
        let err = SysfsGpio::open_at(tmp.path(), &[4]).err().unwrap();
        assert!(matches!(err, SourceError::Io { line: 4, op: "set direction", .. }));
        assert_eq!(fs::read_to_string(tmp.path().join("export")).unwrap(), "4");
        assert_eq!(fs::read_to_string(tmp.path().join("unexport")).unwrap(), "4");
    }

    #[test]
    fn garbage_value_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fake_line(tmp.path(), 6, "x");
        let mut gpio = SysfsGpio::open_at(tmp.path(), &[6]).unwrap();
        assert!(matches!(
            gpio.read(6),
            Err(SourceError::InvalidValue { line: 6, .. })
        ));
    }

    #[test]
    fn unknown_line_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::open_at(tmp.path(), &[]).unwrap();
        assert!(matches!(
            gpio.read(9),
            Err(SourceError::UnknownLine { line: 9, .. })
        ));
    }
}
