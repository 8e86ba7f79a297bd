//! Panel geometry.
//!
//! The screen is split into a fixed-height header and a body. The body is
//! the strip-chart alone, or the strip-chart on the left half and the
//! trajectory panel on the right half. Geometry is only recomputed when the
//! viewport size or the trajectory visibility changes.

use ratatui::prelude::*;

/// Rows taken by the header panel (border, two text lines, border).
pub const HEADER_HEIGHT: u16 = 4;

/// Current panel rectangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelLayout {
    viewport: Rect,
    trajectory_visible: bool,
    computed: bool,
    pub header: Rect,
    pub main: Rect,
    pub trajectory: Option<Rect>,
}

impl PanelLayout {
    /// Partition `viewport` without touching any cached geometry.
    pub fn split(viewport: Rect, trajectory_visible: bool) -> (Rect, Rect, Option<Rect>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(viewport);
        let (header, body) = (rows[0], rows[1]);

        if !trajectory_visible {
            return (header, body, None);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
            .split(body);
        (header, cols[0], Some(cols[1]))
    }

    /// Recompute if the inputs changed. Returns whether the geometry moved.
    pub fn recompute(&mut self, viewport: Rect, trajectory_visible: bool) -> bool {
        if self.computed
            && self.viewport == viewport
            && self.trajectory_visible == trajectory_visible
        {
            return false;
        }
        let (header, main, trajectory) = Self::split(viewport, trajectory_visible);
        let changed = !self.computed
            || header != self.header
            || main != self.main
            || trajectory != self.trajectory;
        self.viewport = viewport;
        self.trajectory_visible = trajectory_visible;
        self.computed = true;
        self.header = header;
        self.main = main;
        self.trajectory = trajectory;
        changed
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Zero-width or zero-height viewports are not painted.
    pub fn is_degenerate(&self) -> bool {
        self.viewport.width == 0 || self.viewport.height == 0
    }
}
