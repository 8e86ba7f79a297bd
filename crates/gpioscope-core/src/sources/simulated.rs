//! SimulatedLines: synthetic inputs for running without hardware.
//!
//! Each line keeps its state between ticks and flips with a fixed
//! probability, which gives strip-charts with runs of highs and lows.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::source::{LineReader, ReaderInfo, ReaderKind, SourceError};

/// Chance that a line changes state on a given tick.
pub const DEFAULT_TOGGLE_PROBABILITY: f64 = 0.15;

static SIMULATED_INFO: ReaderInfo = ReaderInfo {
    name: "simulated",
    description: "Randomly toggling synthetic lines",
    kind: ReaderKind::Simulated,
};

/// Synthetic line reader.
pub struct SimulatedLines {
    rng: StdRng,
    toggle_probability: f64,
    states: HashMap<u32, bool>,
}

impl SimulatedLines {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng(), DEFAULT_TOGGLE_PROBABILITY)
    }

    /// Deterministic lines for tests and demos.
    pub fn seeded(seed: u64, toggle_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), toggle_probability)
    }

    fn with_rng(rng: StdRng, toggle_probability: f64) -> Self {
        Self {
            rng,
            toggle_probability: toggle_probability.clamp(0.0, 1.0),
            states: HashMap::new(),
        }
    }
}

impl Default for SimulatedLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader for SimulatedLines {
    fn info(&self) -> &ReaderInfo {
        &SIMULATED_INFO
    }

    fn read(&mut self, line: u32) -> Result<bool, SourceError> {
        let flip = self.rng.random_bool(self.toggle_probability);
        let state = self.states.entry(line).or_insert(false);
        if flip {
            *state = !*state;
        }
        Ok(*state)
    }
}
