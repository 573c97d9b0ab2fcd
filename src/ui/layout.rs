use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    ui::{
        app::App,
        components::{
            DesktopBar, FullScreenTransport, MiniBar, sidebar::Sidebar, spinner::Spinner,
            track_list::TrackList,
        },
        state::Tab,
    },
    util::colors,
};

/// Below this width the transport collapses to the mini bar.
pub const DESKTOP_MIN_WIDTH: u16 = 80;

pub struct AppLayout<'a> {
    app: &'a App,
}

impl<'a> AppLayout<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }

    pub fn render(self, f: &mut Frame, area: Rect) {
        let app = self.app;
        let snapshot = app.snapshot();
        let tick = app.ui.tick;
        f.buffer_mut()
            .set_style(area, Style::new().bg(colors::BACKGROUND));

        if snapshot.is_mobile_expanded {
            f.render_widget(FullScreenTransport::new(&snapshot).tick(tick), area);
            return;
        }

        let desktop = area.width >= DESKTOP_MIN_WIDTH;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(if desktop { 3 } else { 2 }),
            ])
            .split(area);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(1)])
            .split(chunks[0]);

        let sidebar_block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .title("beatstore")
            .title_alignment(Alignment::Center);
        let sidebar_inner = sidebar_block.inner(main_chunks[0]);
        f.render_widget(sidebar_block, main_chunks[0]);
        f.render_widget(Sidebar::new(app.tab_counts(), app.ui.tab), sidebar_inner);

        let title = match (&app.ui.last_query, app.ui.tab) {
            (Some(query), Tab::Catalog) => format!(" Catalog: \"{query}\" "),
            (_, tab) => format!(" {} ", tab.title()),
        };
        let content_block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .title(title);
        let content_inner = content_block.inner(main_chunks[1]);
        f.render_widget(content_block, main_chunks[1]);

        let rows = app.rows();
        if rows.is_empty() && app.ui.tab == Tab::Catalog && app.ui.catalog_loading {
            f.render_widget(
                Spinner::new(tick)
                    .with_style(Style::new().fg(colors::ACCENT))
                    .with_label("Loading beats"),
                content_inner,
            );
        } else if rows.is_empty() {
            f.render_widget(
                Paragraph::new("Nothing here yet".fg(colors::NEUTRAL)).centered(),
                content_inner,
            );
        } else {
            let playing = snapshot.current_track.as_ref().map(|t| t.id.as_str());
            f.render_widget(
                TrackList::new(&rows, app.ui.selected).playing(playing, snapshot.is_playing, tick),
                content_inner,
            );
        }

        f.render_widget(Paragraph::new(self.status_line()), chunks[1]);

        if desktop {
            f.render_widget(DesktopBar::new(&snapshot).tick(tick), chunks[2]);
        } else {
            f.render_widget(MiniBar::new(&snapshot).tick(tick), chunks[2]);
        }
    }

    fn status_line(&self) -> Line<'static> {
        let ui = &self.app.ui;
        if let Some(input) = &ui.search_input {
            return Line::from(vec!["/".fg(colors::PRIMARY), format!("{input}▏").into()]);
        }
        if let Some(message) = &ui.status_message {
            return Line::from(message.clone().fg(colors::ACCENT));
        }
        Line::from(
            format!(
                " enter play  space pause  l like  c cart ({})  t license  b checkout  / search  f expand  q quit",
                self.app.license
            )
            .fg(colors::NEUTRAL),
        )
    }
}
