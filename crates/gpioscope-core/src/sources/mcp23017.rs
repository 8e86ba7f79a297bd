//! Mcp23017: 16-line I²C port expander read through Linux i2c-dev.
//!
//! Both 8-bit ports are configured as inputs when the device is opened. Each
//! tick reads GPIOA and GPIOB in one sequential transaction and serves the
//! 16 lines from that word.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use crate::channel::EXPANDER_LINES;
use crate::source::{LineReader, ReaderInfo, ReaderKind, SourceError};

/// `I2C_SLAVE` request from `<linux/i2c-dev.h>`.
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Port A direction register (BANK=0 layout); port B follows it.
const REG_IODIRA: u8 = 0x00;

/// Port A input register; port B follows it.
const REG_GPIOA: u8 = 0x12;

static MCP23017_INFO: ReaderInfo = ReaderInfo {
    name: "mcp23017",
    description: "MCP23017 16-line expander on an I2C bus",
    kind: ReaderKind::Expander,
};

/// Expander reader.
pub struct Mcp23017 {
    bus: u8,
    address: u16,
    device: File,
    /// Port word fetched by the last successful `begin_tick`.
    word: Option<u16>,
}

impl Mcp23017 {
    /// Open `/dev/i2c-<bus>`, bind `address` and configure both ports as inputs.
    pub fn open(bus: u8, address: u16) -> Result<Self, SourceError> {
        let path = PathBuf::from(format!("/dev/i2c-{bus}"));
        let bus_err = |source| SourceError::Bus {
            bus,
            address,
            source,
        };
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(bus_err)?;

        // SAFETY: the fd belongs to `device`, which outlives this call;
        // I2C_SLAVE takes the 7-bit address by value.
        let ret = unsafe {
            libc::ioctl(
                device.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(address),
            )
        };
        if ret < 0 {
            return Err(bus_err(std::io::Error::last_os_error()));
        }

        let mut expander = Self {
            bus,
            address,
            device,
            word: None,
        };
        expander
            .device
            .write_all(&[REG_IODIRA, 0xFF, 0xFF])
            .map_err(bus_err)?;
        log::info!("mcp23017: bus {bus} address {address:#04x} ready");
        Ok(expander)
    }

    fn fetch_word(&mut self) -> std::io::Result<u16> {
        self.device.write_all(&[REG_GPIOA])?;
        let mut ports = [0u8; 2];
        self.device.read_exact(&mut ports)?;
        Ok(port_word(ports))
    }
}

/// Combine GPIOA (low byte) and GPIOB (high byte).
fn port_word(ports: [u8; 2]) -> u16 {
    u16::from_le_bytes(ports)
}

fn line_bit(word: u16, line: u32) -> bool {
    (word >> line) & 1 == 1
}

impl LineReader for Mcp23017 {
    fn info(&self) -> &ReaderInfo {
        &MCP23017_INFO
    }

    fn begin_tick(&mut self) -> Result<(), SourceError> {
        self.word = None;
        let word = self.fetch_word().map_err(|source| SourceError::Bus {
            bus: self.bus,
            address: self.address,
            source,
        })?;
        self.word = Some(word);
        Ok(())
    }

    fn read(&mut self, line: u32) -> Result<bool, SourceError> {
        if line >= EXPANDER_LINES {
            return Err(SourceError::UnknownLine {
                line,
                reader: MCP23017_INFO.name,
            });
        }
        match self.word {
            Some(word) => Ok(line_bit(word, line)),
            None => Err(SourceError::Bus {
                bus: self.bus,
                address: self.address,
                source: std::io::Error::other("no port data for this tick"),
            }),
        }
    }
}

impl Drop for Mcp23017 {
    fn drop(&mut self) {
        log::debug!("mcp23017: bus {} address {:#04x} released", self.bus, self.address);
    }
}
