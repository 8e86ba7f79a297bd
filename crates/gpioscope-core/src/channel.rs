//! Monitored input lines.
//!
//! A [`Channel`] is defined once from configuration and never changes
//! afterwards. Its id decides which bank it is read from: ids below
//! [`EXPANDER_BASE_ID`] are primary lines, the 16 ids starting at
//! [`EXPANDER_BASE_ID`] map onto the bus-attached expander.

use std::fmt;

/// First channel id routed to the expander group.
pub const EXPANDER_BASE_ID: u32 = 100;

/// Number of lines on the expander group (two 8-bit ports).
pub const EXPANDER_LINES: u32 = 16;

/// Stable channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

impl ChannelId {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Which bank this id is read from.
    pub fn bank(self) -> Bank {
        if (EXPANDER_BASE_ID..EXPANDER_BASE_ID + EXPANDER_LINES).contains(&self.0) {
            Bank::Expander {
                line: self.0 - EXPANDER_BASE_ID,
            }
        } else {
            Bank::Primary { line: self.0 }
        }
    }

    /// Generated display label used when configuration gives none.
    pub fn default_label(self) -> String {
        match self.bank() {
            Bank::Primary { line } => format!("BCM {line}"),
            Bank::Expander { line } => {
                let port = if line < 8 { 'A' } else { 'B' };
                format!("MCP GP{port}{}", line % 8)
            }
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware bank a channel lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// Directly attached digital input, addressed by its line number.
    Primary { line: u32 },
    /// Expander line 0..16 (GPA0..GPA7 then GPB0..GPB7).
    Expander { line: u32 },
}

/// One monitored binary input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub label: String,
}

impl Channel {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        let id = ChannelId(id);
        let label = label.into();
        let label = if label.trim().is_empty() {
            id.default_label()
        } else {
            label
        };
        Self { id, label }
    }

    pub fn bank(&self) -> Bank {
        self.id.bank()
    }
}
