use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    symbols::{self, border},
    text::{Line, Span, ToSpan},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use super::{gauge::ProgressGauge, spinner, transport};
use crate::{audio::PlayerSnapshot, util::colors};

/// Three-row transport for wide terminals: controls, progress, volume.
pub struct DesktopBar<'a> {
    snapshot: &'a PlayerSnapshot,
    tick: u64,
}

impl<'a> DesktopBar<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot) -> Self {
        Self { snapshot, tick: 0 }
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }
}

impl Widget for DesktopBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        let [controls_area, progress_area, volume_area] = Layout::horizontal([
            Constraint::Length(17),
            Constraint::Min(10),
            Constraint::Length(12),
        ])
        .areas(area);

        let mut controls = Line::default();
        controls.push_span(transport::shuffle_icon(s.shuffle));
        controls.push_span("  ⏮  ");
        controls.push_span(if s.is_loading {
            spinner::frame(self.tick).fg(colors::ACCENT)
        } else {
            transport::play_icon(s).fg(colors::PRIMARY)
        });
        controls.push_span("  ⏭  ");
        controls.push_span(transport::repeat_icon(s.repeat));

        Paragraph::new(controls)
            .centered()
            .block(Block::default().borders(Borders::ALL).border_set(border::Set {
                top_right: symbols::line::ROUNDED.horizontal_down,
                bottom_right: symbols::line::ROUNDED.horizontal_up,
                ..symbols::border::ROUNDED
            }))
            .render(controls_area, buf);

        let mut heading = Line::default();
        heading.push_span(format!(" {} ", transport::title(s)).bold());
        if let Some(producer) = transport::producer(s) {
            heading.push_span(format!("by {producer} ").fg(colors::NEUTRAL));
        }
        if let Some(error) = transport::error_span(s) {
            heading.push_span(error);
            heading.push_span(" ");
        }

        ProgressGauge::default()
            .block(
                Block::default()
                    .title_top(heading)
                    .title_alignment(Alignment::Center)
                    .borders(Borders::TOP | Borders::BOTTOM),
            )
            .ratio(s.ratio())
            .label(transport::times(s).to_span().fg(colors::ACCENT))
            .played_style(Style::new().fg(colors::PRIMARY).bg(colors::SECONDARY))
            .remaining_style(Style::new().fg(colors::BACKGROUND).bg(colors::BACKGROUND))
            .render(progress_area, buf);

        let volume = transport::volume_percent(s);
        let label: Span = if s.is_muted {
            "muted".fg(colors::NEUTRAL)
        } else {
            format!("{volume}%").into()
        };
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_set(border::Set {
                top_left: symbols::line::ROUNDED.horizontal_down,
                bottom_left: symbols::line::ROUNDED.horizontal_up,
                ..symbols::border::ROUNDED
            }))
            .gauge_style(Style::new().fg(colors::PRIMARY).bg(colors::NEUTRAL))
            .ratio(f64::from(volume) / 100.0)
            .label(label)
            .render(volume_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{PlaybackStatus, RepeatMode},
        model::track::track,
    };
    use ratatui::{Terminal, backend::TestBackend};
    use std::time::Duration;

    fn rendered(snapshot: &PlayerSnapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 3)).unwrap();
        terminal
            .draw(|f| f.render_widget(DesktopBar::new(snapshot), f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn renders_title_time_and_volume() {
        let snapshot = PlayerSnapshot {
            current_track: Some(track("a")),
            status: PlaybackStatus::Paused,
            current_time: Duration::from_secs(30),
            duration: Some(Duration::from_secs(120)),
            volume: 0.4,
            repeat: RepeatMode::One,
            ..Default::default()
        };
        let text = rendered(&snapshot);
        assert!(text.contains("Beat a"));
        assert!(text.contains("00:30 / 02:00"));
        assert!(text.contains("40%"));
        assert!(text.contains("▶"));
    }

    #[test]
    fn muted_shows_label() {
        let snapshot = PlayerSnapshot {
            is_muted: true,
            ..Default::default()
        };
        assert!(rendered(&snapshot).contains("muted"));
    }
}
