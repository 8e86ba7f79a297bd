//! Trajectory tracking.
//!
//! Four designated channels (north/south/east/west) move a cursor around
//! the centre of the trajectory panel:
//!
//! ```text
//! row = center_row - scale * (north - south)
//! col = center_col + scale * (east - west)
//! ```
//!
//! The tracker keeps the last [`PATH_CAPACITY`] points and turns them into
//! paint cells: connecting segments, a block per visited point, and the
//! cursor on top. Coordinates are never clamped; clipping is the painter's job.

use std::collections::VecDeque;

use crate::channel::ChannelId;
use crate::history::HistorySnapshot;

/// Maximum number of points retained in the path.
pub const PATH_CAPACITY: usize = 100;

/// Largest scale magnitude; keeps one segment to a few thousand cells.
pub const MAX_SCALE: i32 = i16::MAX as i32;

/// A cell position relative to the trajectory panel origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrajectoryPoint {
    pub row: i32,
    pub col: i32,
}

impl TrajectoryPoint {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Channel ids for the four axes. Unset axes read as constantly low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrajectoryAxes {
    pub north: Option<ChannelId>,
    pub south: Option<ChannelId>,
    pub east: Option<ChannelId>,
    pub west: Option<ChannelId>,
}

impl TrajectoryAxes {
    /// Latest state of each axis.
    pub fn sample(&self, history: &HistorySnapshot<'_>) -> AxisSample {
        let read = |axis: Option<ChannelId>| axis.is_some_and(|id| history.latest(id));
        AxisSample {
            north: read(self.north),
            south: read(self.south),
            east: read(self.east),
            west: read(self.west),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.north.is_some() || self.south.is_some() || self.east.is_some() || self.west.is_some()
    }
}

/// Axis states for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSample {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl AxisSample {
    /// Point for these states around `center` (row, col).
    ///
    /// Saturates at the `i32` limits instead of overflowing.
    pub fn to_point(self, center: TrajectoryPoint, scale: i32) -> TrajectoryPoint {
        let v = |b: bool| i32::from(b);
        TrajectoryPoint {
            row: center
                .row
                .saturating_sub(scale.saturating_mul(v(self.north) - v(self.south))),
            col: center
                .col
                .saturating_add(scale.saturating_mul(v(self.east) - v(self.west))),
        }
    }
}

/// What a paint cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    /// A visited point.
    Block,
    Vertical,
    Horizontal,
    Diagonal,
    /// The current point.
    Cursor,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Block => "█",
            Self::Vertical => "|",
            Self::Horizontal => "-",
            Self::Diagonal => "*",
            Self::Cursor => "O",
        }
    }
}

/// One cell to paint in the trajectory panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintCell {
    pub row: i32,
    pub col: i32,
    pub glyph: Glyph,
}

impl PaintCell {
    fn at(point: TrajectoryPoint, glyph: Glyph) -> Self {
        Self {
            row: point.row,
            col: point.col,
            glyph,
        }
    }
}

/// Interior cells of the segment from `from` to `to`, endpoints excluded.
///
/// Pure vertical and horizontal moves are filled completely. Any other move
/// steps both axes by one per cell and stops as soon as either axis reaches
/// its target, so a move whose row and column deltas differ in magnitude
/// is drawn only partially.
pub fn rasterize_segment(from: TrajectoryPoint, to: TrajectoryPoint) -> Vec<PaintCell> {
    if from.col == to.col {
        let (lo, hi) = (from.row.min(to.row), from.row.max(to.row));
        return (lo.saturating_add(1)..hi)
            .map(|row| PaintCell {
                row,
                col: to.col,
                glyph: Glyph::Vertical,
            })
            .collect();
    }
    if from.row == to.row {
        let (lo, hi) = (from.col.min(to.col), from.col.max(to.col));
        return (lo.saturating_add(1)..hi)
            .map(|col| PaintCell {
                row: to.row,
                col,
                glyph: Glyph::Horizontal,
            })
            .collect();
    }

    let step_row = if to.row > from.row { 1 } else { -1 };
    let step_col = if to.col > from.col { 1 } else { -1 };
    let (mut row, mut col) = (from.row + step_row, from.col + step_col);
    let mut cells = Vec::new();
    while row != to.row && col != to.col {
        cells.push(PaintCell {
            row,
            col,
            glyph: Glyph::Diagonal,
        });
        row += step_row;
        col += step_col;
    }
    cells
}

/// Converts axis states into a bounded path and its paint cells.
///
/// Constructed once at startup; the path survives hiding and showing the
/// trajectory panel.
#[derive(Debug, Clone)]
pub struct TrajectoryTracker {
    axes: TrajectoryAxes,
    scale: i32,
    path: VecDeque<TrajectoryPoint>,
}

impl TrajectoryTracker {
    /// `scale` is clamped to `±MAX_SCALE`.
    pub fn new(axes: TrajectoryAxes, scale: i32) -> Self {
        Self {
            axes,
            scale: scale.clamp(-MAX_SCALE, MAX_SCALE),
            path: VecDeque::with_capacity(PATH_CAPACITY + 1),
        }
    }

    pub fn axes(&self) -> &TrajectoryAxes {
        &self.axes
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Compute the current point from the latest history and push it.
    pub fn track(&mut self, history: &HistorySnapshot<'_>, center: TrajectoryPoint) -> TrajectoryPoint {
        let sample = self.axes.sample(history);
        self.update(sample, center)
    }

    /// Push the point for `sample`, evicting the oldest once over capacity.
    pub fn update(&mut self, sample: AxisSample, center: TrajectoryPoint) -> TrajectoryPoint {
        let point = sample.to_point(center, self.scale);
        self.path.push_back(point);
        while self.path.len() > PATH_CAPACITY {
            self.path.pop_front();
        }
        point
    }

    /// Most recently pushed point.
    pub fn current(&self) -> Option<TrajectoryPoint> {
        self.path.back().copied()
    }

    /// Path points, oldest first.
    pub fn path(&self) -> impl ExactSizeIterator<Item = TrajectoryPoint> + '_ {
        self.path.iter().copied()
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Cells in paint order: segments, then visited blocks, then the cursor.
    pub fn cells(&self) -> Vec<PaintCell> {
        let mut cells = Vec::new();
        for (prev, curr) in self.path.iter().zip(self.path.iter().skip(1)) {
            cells.extend(rasterize_segment(*prev, *curr));
        }
        cells.extend(self.path.iter().map(|&p| PaintCell::at(p, Glyph::Block)));
        if let Some(current) = self.current() {
            cells.push(PaintCell::at(current, Glyph::Cursor));
        }
        cells
    }
}
