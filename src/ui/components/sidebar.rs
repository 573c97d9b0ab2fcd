use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, Widget},
};

use crate::{ui::state::Tab, util::colors};

/// Tab list with per-collection counts; `None` renders as "…" while the
/// collection has never been fetched.
pub struct Sidebar {
    entries: Vec<(Tab, Option<usize>)>,
    selected: Tab,
}

impl Sidebar {
    pub fn new(entries: Vec<(Tab, Option<usize>)>, selected: Tab) -> Self {
        Self { entries, selected }
    }
}

impl Widget for Sidebar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let items: Vec<ListItem> = self
            .entries
            .into_iter()
            .map(|(tab, count)| {
                let style = if tab == self.selected {
                    Style::default()
                        .fg(colors::PRIMARY)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors::NEUTRAL)
                };
                let count = count.map_or_else(|| "…".to_string(), |c| c.to_string());
                ListItem::new(Line::from(format!(" {} {:<10} {count}", tab.key(), tab.title())))
                    .style(style)
            })
            .collect();

        List::new(items).render(area, buf);
    }
}
