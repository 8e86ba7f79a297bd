//! Log destination prompt.
//!
//! A one-line path editor shown over the dashboard. The loop keeps running
//! while it is open; only key handling is redirected to it.

use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;

/// Result of feeding one key to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// Still editing.
    Editing,
    Cancelled,
    Confirmed(PathBuf),
}

/// Editable destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPicker {
    input: String,
}

impl DestinationPicker {
    /// Start editing from the current destination.
    pub fn new(current: &Path) -> Self {
        Self {
            input: current.display().to_string(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyCode) -> PickerEvent {
        match key {
            KeyCode::Esc => PickerEvent::Cancelled,
            KeyCode::Enter => {
                let trimmed = self.input.trim();
                if trimmed.is_empty() {
                    PickerEvent::Cancelled
                } else {
                    PickerEvent::Confirmed(expand_home(trimmed))
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                PickerEvent::Editing
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                PickerEvent::Editing
            }
            _ => PickerEvent::Editing,
        }
    }
}

/// Expand a leading `~/` using `$HOME`.
fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(input),
    }
}
