use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::{gauge::ProgressGauge, spinner, transport};
use crate::{
    audio::PlayerSnapshot,
    ui::util::format_price,
    util::colors,
};

/// Expanded transport, drawn over everything while `is_mobile_expanded`.
pub struct FullScreenTransport<'a> {
    snapshot: &'a PlayerSnapshot,
    tick: u64,
}

impl<'a> FullScreenTransport<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot) -> Self {
        Self { snapshot, tick: 0 }
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    fn details(&self) -> Line<'static> {
        let Some(track) = &self.snapshot.current_track else {
            return Line::default();
        };
        let mut parts = Vec::new();
        if let Some(bpm) = track.bpm {
            parts.push(format!("{bpm} BPM"));
        }
        if let Some(key) = &track.musical_key {
            parts.push(key.clone());
        }
        if track.price > 0.0 {
            parts.push(format_price(track.price));
        }
        Line::from(parts.join("  ·  ").fg(colors::NEUTRAL)).centered()
    }
}

impl Widget for FullScreenTransport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .title_top(Line::from(" Now playing ").centered())
            .title_bottom(Line::from(" esc: collapse ").centered().fg(colors::NEUTRAL))
            .style(Style::new().bg(colors::BACKGROUND));
        let inner = block.inner(area);
        block.render(area, buf);

        let [
            title_area,
            producer_area,
            details_area,
            _,
            progress_area,
            times_area,
            _,
            controls_area,
            modes_area,
            status_area,
        ] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .flex(Flex::Center)
        .areas(inner);

        Paragraph::new(Line::from(transport::title(s).bold().fg(colors::ACCENT)).centered())
            .render(title_area, buf);
        if let Some(producer) = transport::producer(s) {
            Paragraph::new(Line::from(producer.to_string()).centered()).render(producer_area, buf);
        }
        Paragraph::new(self.details()).render(details_area, buf);

        let [bar_area] = Layout::horizontal([Constraint::Percentage(80)])
            .flex(Flex::Center)
            .areas(progress_area);
        ProgressGauge::default()
            .ratio(s.ratio())
            .played_style(Style::new().fg(colors::PRIMARY).bg(colors::BACKGROUND))
            .remaining_style(Style::new().fg(colors::NEUTRAL).bg(colors::NEUTRAL))
            .render(bar_area, buf);
        Paragraph::new(Line::from(transport::times(s)).centered()).render(times_area, buf);

        let play = if s.is_loading {
            spinner::frame(self.tick).fg(colors::ACCENT)
        } else {
            transport::play_icon(s).fg(colors::PRIMARY)
        };
        Paragraph::new(Line::from(vec!["⏮    ".into(), play, "    ⏭".into()]).centered())
            .render(controls_area, buf);

        let volume: Span = if s.is_muted {
            "muted".fg(colors::NEUTRAL)
        } else {
            format!("vol {}%", transport::volume_percent(s)).into()
        };
        Paragraph::new(
            Line::from(vec![
                transport::shuffle_icon(s.shuffle),
                "   ".into(),
                transport::repeat_icon(s.repeat),
                "   ".into(),
                volume,
            ])
            .centered(),
        )
        .render(modes_area, buf);

        let status = match (transport::error_span(s), s.context_index) {
            (Some(error), _) => Line::from(error),
            (None, Some(index)) if s.context_len > 1 => {
                Line::from(format!("{} of {}", index + 1, s.context_len).fg(colors::NEUTRAL))
            }
            _ => Line::default(),
        };
        Paragraph::new(status.centered()).render(status_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::track;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn shows_details_and_queue_position() {
        let snapshot = PlayerSnapshot {
            current_track: Some(track("a")),
            is_mobile_expanded: true,
            context_index: Some(2),
            context_len: 5,
            ..Default::default()
        };
        let mut terminal = Terminal::new(TestBackend::new(50, 16)).unwrap();
        terminal
            .draw(|f| f.render_widget(FullScreenTransport::new(&snapshot), f.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(text.contains("Now playing"));
        assert!(text.contains("Beat a"));
        assert!(text.contains("140 BPM"));
        assert!(text.contains("3 of 5"));
    }
}
