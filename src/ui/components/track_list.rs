use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Cell, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::{
    model::TrackId,
    sync::EntryStatus,
    ui::util::active_track_icon,
    util::colors,
};

#[derive(Debug, Clone)]
pub struct TrackRow {
    pub track_id: TrackId,
    pub title: String,
    pub subtitle: String,
    pub detail: String,
    pub liked: bool,
    pub in_cart: bool,
    pub status: EntryStatus,
}

pub struct TrackList<'a> {
    rows: &'a [TrackRow],
    selected: usize,
    playing: Option<&'a str>,
    is_playing: bool,
    tick: u64,
}

impl<'a> TrackList<'a> {
    pub fn new(rows: &'a [TrackRow], selected: usize) -> Self {
        Self {
            rows,
            selected,
            playing: None,
            is_playing: false,
            tick: 0,
        }
    }

    pub fn playing(mut self, track_id: Option<&'a str>, is_playing: bool, tick: u64) -> Self {
        self.playing = track_id;
        self.is_playing = is_playing;
        self.tick = tick;
        self
    }
}

impl Widget for TrackList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.rows.iter().map(|row| {
            let marker = if self.playing == Some(row.track_id.as_str()) {
                Span::styled(
                    active_track_icon(self.is_playing, self.tick),
                    Style::new().fg(colors::PRIMARY),
                )
            } else {
                Span::raw(" ")
            };
            let mut flags = Line::default();
            flags.push_span(if row.liked { "♥".fg(colors::PRIMARY) } else { " ".into() });
            flags.push_span(if row.in_cart { "$".fg(colors::ACCENT) } else { " ".into() });
            flags.push_span(match row.status {
                EntryStatus::Pending => "~".fg(colors::NEUTRAL),
                EntryStatus::Failed => "!".fg(colors::ERROR),
                EntryStatus::Confirmed => " ".into(),
            });

            Row::new(vec![
                Cell::from(marker),
                Cell::from(row.title.clone()),
                Cell::from(row.subtitle.clone().fg(colors::NEUTRAL)),
                Cell::from(row.detail.clone()),
                Cell::from(flags),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Length(12),
                Constraint::Length(3),
            ],
        )
        .row_highlight_style(
            Style::new()
                .fg(colors::BACKGROUND)
                .bg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        );

        let mut state = TableState::default().with_selected(
            (!self.rows.is_empty()).then(|| self.selected.min(self.rows.len() - 1)),
        );
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
