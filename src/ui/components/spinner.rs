use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn frame(tick: u64) -> &'static str {
    FRAMES[(tick / 3) as usize % FRAMES.len()]
}

/// Centred braille spinner with an optional label.
pub struct Spinner {
    tick: u64,
    style: Style,
    label: Option<String>,
}

impl Spinner {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            style: Style::default(),
            label: None,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Widget for Spinner {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let symbol = frame(self.tick);
        let text = match self.label {
            Some(label) => format!("{symbol} {label}"),
            None => symbol.to_string(),
        };

        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(x, y, text, area.width as usize, self.style);
    }
}
