use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::{gauge::ProgressGauge, spinner, transport};
use crate::{audio::PlayerSnapshot, util::colors};

/// Two-row bar for narrow terminals: track line over a thin progress strip.
pub struct MiniBar<'a> {
    snapshot: &'a PlayerSnapshot,
    tick: u64,
}

impl<'a> MiniBar<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot) -> Self {
        Self { snapshot, tick: 0 }
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }
}

impl Widget for MiniBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        let [info_area, progress_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let status = if s.is_loading {
            Span::styled(spinner::frame(self.tick), Style::new().fg(colors::ACCENT))
        } else {
            Span::styled(transport::play_icon(s), Style::new().fg(colors::PRIMARY))
        };

        let mut line = Line::default();
        line.push_span(status);
        line.push_span(" ");
        line.push_span(transport::title(s).bold());
        if let Some(producer) = transport::producer(s) {
            line.push_span(format!(" · {producer}").fg(colors::NEUTRAL));
        }
        if let Some(error) = transport::error_span(s) {
            line.push_span("  ");
            line.push_span(error);
        }

        let [text_area, time_area] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(13)]).areas(info_area);
        Paragraph::new(line).render(text_area, buf);
        Paragraph::new(transport::times(s))
            .right_aligned()
            .render(time_area, buf);

        ProgressGauge::default()
            .ratio(s.ratio())
            .played_style(Style::new().fg(colors::PRIMARY).bg(colors::BACKGROUND))
            .remaining_style(Style::new().fg(colors::NEUTRAL).bg(colors::NEUTRAL))
            .render(progress_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::PlaybackStatus, model::track::track};
    use ratatui::{Terminal, backend::TestBackend};
    use std::time::Duration;

    fn rendered(snapshot: &PlayerSnapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 2)).unwrap();
        terminal
            .draw(|f| f.render_widget(MiniBar::new(snapshot), f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_track_and_time() {
        let snapshot = PlayerSnapshot {
            current_track: Some(track("a")),
            status: PlaybackStatus::Playing,
            is_playing: true,
            current_time: Duration::from_secs(61),
            duration: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let text = rendered(&snapshot);
        assert!(text.contains("Beat a"));
        assert!(text.contains("Producer"));
        assert!(text.contains("01:01 / 02:00"));
        assert!(text.contains("⏸"));
    }

    #[test]
    fn idle_and_error_states() {
        let idle = rendered(&PlayerSnapshot::default());
        assert!(idle.contains("Nothing playing"));
        assert!(idle.contains("--:--"));

        let failed = PlayerSnapshot {
            current_track: Some(track("a")),
            last_error: Some("Network error".into()),
            ..Default::default()
        };
        assert!(rendered(&failed).contains("couldn't play"));
    }
}
