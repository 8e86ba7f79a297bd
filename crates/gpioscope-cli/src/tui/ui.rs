//! TUI rendering: one parameterized painter for every panel combination.
//!
//! ┌ gpioscope ─────────────────────── log: ./host_gpio_log.jsonl ┐
//! │ p pause  l log  v trajectory  -/+ interval  [/] history  ... │
//! │ PAUSED<p>  LOGGING<l>  POLLING<-/+>: 0.10s  HISTORY<[/]>: 50 │
//! └──────────────────────────────────────────────────────────────┘
//! ┌ Channels ─────────────────────┐┌ Trajectory ─────────────────┐
//! │ Door   BCM17 __--__-_-_----__ ││        █-█                  │
//! │ Button BCM27 ____-----__-___- ││          |                  │
//! │ ...                           ││          O                  │
//! └───────────────────────────────┘└─────────────────────────────┘

use std::path::Path;
use std::time::Instant;

use gpioscope_core::{
    Bank, FlashGroup, Glyph, HistorySnapshot, PaintCell, ScopeConfig, SessionState,
    TrajectoryPoint, TrajectoryTracker,
};
use ratatui::layout::Position;
use ratatui::{prelude::*, widgets::*};

use super::layout::PanelLayout;
use super::picker::DestinationPicker;

/// Everything one frame is painted from.
pub struct View<'a> {
    pub config: &'a ScopeConfig,
    pub state: &'a SessionState,
    pub history: HistorySnapshot<'a>,
    pub tracker: &'a TrajectoryTracker,
    pub layout: &'a PanelLayout,
    pub picker: Option<&'a DestinationPicker>,
    pub log_destination: &'a Path,
    pub log_records: u64,
    pub log_error: Option<&'a str>,
    pub now: Instant,
}

pub fn draw(f: &mut Frame, view: &View<'_>) {
    draw_header(f, view.layout.header, view);
    draw_channels(f, view.layout.main, view);
    if let Some(area) = view.layout.trajectory {
        f.render_widget(TrajectoryView::new(view.tracker), area);
    }
    if let Some(picker) = view.picker {
        draw_picker(f, f.area(), picker);
    }
}

/// Centre of a trajectory panel, relative to the panel origin.
pub fn trajectory_center(area: Rect) -> TrajectoryPoint {
    TrajectoryPoint::new(i32::from(area.height / 2), i32::from(area.width / 2))
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn draw_header(f: &mut Frame, area: Rect, view: &View<'_>) {
    let state = view.state;
    let key = Style::default().fg(Color::Cyan);

    let keys = Line::from(vec![
        Span::styled(" p", key),
        Span::raw(" pause  "),
        Span::styled("l", key),
        Span::raw(" log  "),
        Span::styled("v", key),
        Span::raw(" trajectory  "),
        Span::styled("-/+", key),
        Span::raw(" interval  "),
        Span::styled("[/]", key),
        Span::raw(" history  "),
        Span::styled("s", key),
        Span::raw(" destination  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ]);

    let paused = if state.is_paused() {
        Style::default().fg(Color::White).bg(Color::Red).bold()
    } else {
        Style::default().bold()
    };
    let logging = if state.is_logging() {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    } else {
        Style::default().bold()
    };
    let flash = |group: FlashGroup| {
        if state.is_flashing(group, view.now) {
            Style::default().fg(Color::Black).bg(Color::Green).bold()
        } else {
            Style::default().bold()
        }
    };

    let status = Line::from(vec![
        Span::raw(" "),
        Span::styled("PAUSED<p>", paused),
        Span::raw("  "),
        Span::styled("LOGGING<l>", logging),
        Span::raw("  "),
        Span::styled("POLLING", Style::default().bold()),
        Span::styled("<-", flash(FlashGroup::IntervalDown)),
        Span::styled("/", Style::default().bold()),
        Span::styled("+>", flash(FlashGroup::IntervalUp)),
        Span::raw(format!(": {:.2}s", state.polling_interval().as_secs_f64())),
        Span::raw("  "),
        Span::styled("HISTORY", Style::default().bold()),
        Span::styled("<[", flash(FlashGroup::HistoryDown)),
        Span::styled("/", Style::default().bold()),
        Span::styled("]>", flash(FlashGroup::HistoryUp)),
        Span::raw(format!(": {}", state.history_length())),
    ]);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " gpioscope ",
            Style::default().bold().fg(Color::Cyan),
        ))
        .title(
            Line::from(Span::styled(
                format!(
                    " log: {}  {} records ",
                    view.log_destination.display(),
                    view.log_records
                ),
                Style::default().fg(Color::DarkGray),
            ))
            .right_aligned(),
        );
    if let Some(err) = view.log_error {
        block = block.title_bottom(Span::styled(
            format!(" log error: {err} "),
            Style::default().fg(Color::Red),
        ));
    }

    f.render_widget(Paragraph::new(vec![keys, status]).block(block), area);
}

// ---------------------------------------------------------------------------
// Strip-chart
// ---------------------------------------------------------------------------

fn bank_tag(bank: Bank) -> String {
    match bank {
        Bank::Primary { line } => format!("BCM{line:<3}"),
        Bank::Expander { line } => format!("MCP{line:<3}"),
    }
}

fn draw_channels(f: &mut Frame, area: Rect, view: &View<'_>) {
    let block = Block::default().borders(Borders::ALL).title(" Channels ");
    let inner = block.inner(area);
    let label_width = view.config.max_label_len();

    let high = Style::default().fg(Color::Red);
    let low = Style::default().fg(Color::Blue);

    let lines: Vec<Line> = view
        .config
        .channels
        .iter()
        .map(|channel| {
            let prefix = format!("{:<label_width$} {} ", channel.label, bank_tag(channel.bank()));
            let room = usize::from(inner.width).saturating_sub(prefix.chars().count());
            let samples: Vec<bool> = view
                .history
                .samples(channel.id)
                .map(Iterator::collect)
                .unwrap_or_default();
            let skip = samples.len().saturating_sub(room);

            let mut spans = vec![Span::styled(prefix, Style::default().bold())];
            spans.extend(samples[skip..].iter().map(|&s| {
                if s {
                    Span::styled("-", high)
                } else {
                    Span::styled("_", low)
                }
            }));
            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// Paints the tracker's cells relative to the panel origin.
///
/// Cells outside the panel are dropped here; the tracker never clamps.
pub struct TrajectoryView<'a> {
    tracker: &'a TrajectoryTracker,
}

impl<'a> TrajectoryView<'a> {
    pub fn new(tracker: &'a TrajectoryTracker) -> Self {
        Self { tracker }
    }
}

impl Widget for TrajectoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default().borders(Borders::ALL).title(" Trajectory ");
        if !self.tracker.axes().is_configured() {
            block = block.title_bottom(Span::styled(
                " no axes configured ",
                Style::default().fg(Color::DarkGray),
            ));
        }
        block.render(area, buf);

        for cell in self.tracker.cells() {
            paint_cell(area, buf, cell);
        }
    }
}

fn paint_cell(area: Rect, buf: &mut Buffer, cell: PaintCell) {
    let (Some(x), Some(y)) = (
        i32::from(area.x).checked_add(cell.col),
        i32::from(area.y).checked_add(cell.row),
    ) else {
        return;
    };
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    let pos = Position::new(x, y);
    if !area.contains(pos) {
        return;
    }
    let color = if cell.glyph == Glyph::Cursor {
        Color::Red
    } else {
        Color::Blue
    };
    if let Some(target) = buf.cell_mut(pos) {
        target.set_symbol(cell.glyph.symbol()).set_fg(color);
    }
}

// ---------------------------------------------------------------------------
// Destination picker
// ---------------------------------------------------------------------------

fn draw_picker(f: &mut Frame, area: Rect, picker: &DestinationPicker) {
    let width = area.width.min(64);
    let height = area.height.min(3);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Log destination (Enter confirm, Esc cancel) ");
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(format!("{}_", picker.input())).block(block),
        popup,
    );
}
