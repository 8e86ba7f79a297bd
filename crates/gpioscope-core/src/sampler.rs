//! Per-tick sampling across the primary lines and the expander group.
//!
//! Failure policy differs by bank: a primary read failure is returned to the
//! caller and ends the session, while an expander failure reads every
//! expander channel as low for that tick and is only counted.

use crate::channel::{Bank, Channel, ChannelId};
use crate::config::ScopeConfig;
use crate::source::{LineReader, SourceError};
use crate::sources::{Mcp23017, SimulatedLines, SysfsGpio};

/// Reads every monitored channel once per tick.
pub struct SampleSource {
    primary: Box<dyn LineReader>,
    expander: Option<Box<dyn LineReader>>,
    expander_failures: u64,
    ticks: u64,
}

impl SampleSource {
    pub fn new(primary: Box<dyn LineReader>, expander: Option<Box<dyn LineReader>>) -> Self {
        Self {
            primary,
            expander,
            expander_failures: 0,
            ticks: 0,
        }
    }

    /// Acquire the hardware described by `config`.
    pub fn open(config: &ScopeConfig) -> Result<Self, SourceError> {
        let lines: Vec<u32> = config
            .channels
            .iter()
            .filter_map(|c| match c.bank() {
                Bank::Primary { line } => Some(line),
                Bank::Expander { .. } => None,
            })
            .collect();
        let primary: Box<dyn LineReader> = Box::new(SysfsGpio::open(&lines)?);
        let expander = match config.expander {
            Some(exp) => {
                let reader: Box<dyn LineReader> = Box::new(Mcp23017::open(exp.bus, exp.address)?);
                Some(reader)
            }
            None => None,
        };
        Ok(Self::new(primary, expander))
    }

    /// Synthetic lines with the same bank layout as `config`.
    pub fn simulated(config: &ScopeConfig) -> Self {
        let expander = config
            .expander
            .map(|_| Box::new(SimulatedLines::new()) as Box<dyn LineReader>);
        Self::new(Box::new(SimulatedLines::new()), expander)
    }

    /// Names of the active readers, primary first.
    pub fn reader_names(&self) -> Vec<&'static str> {
        std::iter::once(self.primary.name())
            .chain(self.expander.as_ref().map(|e| e.name()))
            .collect()
    }

    /// Number of ticks in which the expander read failed.
    pub fn expander_failures(&self) -> u64 {
        self.expander_failures
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Read every channel once.
    pub fn sample(&mut self, channels: &[Channel]) -> Result<Vec<(ChannelId, bool)>, SourceError> {
        self.ticks += 1;
        self.primary.begin_tick()?;

        let mut expander_ok = match self.expander.as_mut() {
            Some(exp) => match exp.begin_tick() {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("expander read failed, reading low this tick: {e}");
                    false
                }
            },
            None => false,
        };

        let mut samples = Vec::with_capacity(channels.len());
        for channel in channels {
            let value = match channel.bank() {
                Bank::Primary { line } => self.primary.read(line)?,
                Bank::Expander { line } => match (self.expander.as_mut(), expander_ok) {
                    (Some(exp), true) => match exp.read(line) {
                        Ok(v) => v,
                        Err(e) => {
                            log::debug!("expander line {line} failed, reading low this tick: {e}");
                            expander_ok = false;
                            false
                        }
                    },
                    _ => false,
                },
            };
            samples.push((channel.id, value));
        }

        if self.expander.is_some() && !expander_ok {
            self.expander_failures += 1;
            // Lines read before the failure are low as well for this tick.
            for (id, value) in &mut samples {
                if matches!(id.bank(), Bank::Expander { .. }) {
                    *value = false;
                }
            }
        }
        Ok(samples)
    }
}
