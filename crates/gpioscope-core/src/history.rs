//! Rolling per-channel sample history.
//!
//! Every channel owns one buffer of boolean samples, oldest first. All
//! buffers share a single `history_length`; after any append or resize
//! completes each buffer holds exactly that many samples.

use std::collections::VecDeque;

use crate::channel::{Channel, ChannelId};

/// One channel's rolling buffer.
#[derive(Debug, Clone)]
struct Track {
    id: ChannelId,
    samples: VecDeque<bool>,
}

/// Owns the rolling buffers of every monitored channel.
#[derive(Debug, Clone)]
pub struct ChannelHistoryStore {
    tracks: Vec<Track>,
    history_length: usize,
}

impl ChannelHistoryStore {
    /// Create zero-filled buffers of `history_length` for each channel.
    ///
    /// A length of 0 is raised to 1.
    pub fn new(channels: &[Channel], history_length: usize) -> Self {
        let history_length = history_length.max(1);
        let tracks = channels
            .iter()
            .map(|c| Track {
                id: c.id,
                samples: std::iter::repeat_n(false, history_length).collect(),
            })
            .collect();
        Self {
            tracks,
            history_length,
        }
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    pub fn channel_count(&self) -> usize {
        self.tracks.len()
    }

    /// Append one sample, evicting the oldest entry once the buffer is full.
    ///
    /// Samples for unknown channels are dropped.
    pub fn append(&mut self, channel: ChannelId, sample: bool) {
        let limit = self.history_length;
        if let Some(track) = self.tracks.iter_mut().find(|t| t.id == channel) {
            track.samples.push_back(sample);
            while track.samples.len() > limit {
                track.samples.pop_front();
            }
        }
    }

    /// Append a whole tick worth of samples.
    pub fn append_tick(&mut self, samples: &[(ChannelId, bool)]) {
        for &(id, sample) in samples {
            self.append(id, sample);
        }
    }

    /// Change the shared length of every buffer.
    ///
    /// Shrinking keeps the most recent `new_length` samples; growing
    /// left-pads with `false`. A length of 0 is rejected and leaves
    /// everything untouched. Returns whether the length was applied.
    pub fn resize(&mut self, new_length: usize) -> bool {
        if new_length < 1 {
            return false;
        }
        for track in &mut self.tracks {
            let len = track.samples.len();
            if new_length < len {
                track.samples.drain(..len - new_length);
            } else {
                for _ in len..new_length {
                    track.samples.push_front(false);
                }
            }
        }
        self.history_length = new_length;
        true
    }

    /// Newest sample of a channel; `false` for unknown channels.
    pub fn latest(&self, channel: ChannelId) -> bool {
        self.tracks
            .iter()
            .find(|t| t.id == channel)
            .and_then(|t| t.samples.back().copied())
            .unwrap_or(false)
    }

    /// Read-only view for rendering and logging.
    pub fn snapshot(&self) -> HistorySnapshot<'_> {
        HistorySnapshot { store: self }
    }
}

/// Borrowed, read-only view of the history.
///
/// Holding one prevents mutation of the store for its lifetime.
#[derive(Debug, Clone, Copy)]
pub struct HistorySnapshot<'a> {
    store: &'a ChannelHistoryStore,
}

impl<'a> HistorySnapshot<'a> {
    pub fn history_length(&self) -> usize {
        self.store.history_length
    }

    /// Samples of one channel, oldest first.
    pub fn samples(&self, channel: ChannelId) -> Option<impl Iterator<Item = bool> + 'a> {
        self.store
            .tracks
            .iter()
            .find(|t| t.id == channel)
            .map(|t| t.samples.iter().copied())
    }

    /// Every channel with its samples, in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &'a VecDeque<bool>)> + 'a {
        self.store.tracks.iter().map(|t| (t.id, &t.samples))
    }

    pub fn latest(&self, channel: ChannelId) -> bool {
        self.store.latest(channel)
    }
}
