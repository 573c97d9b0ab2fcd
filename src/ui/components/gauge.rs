use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Block, Widget},
};

/// Single-row progress bar with eighth-block resolution and a centred label.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressGauge<'a> {
    block: Option<Block<'a>>,
    ratio: f64,
    label: Option<Span<'a>>,
    played_style: Style,
    remaining_style: Style,
}

impl<'a> ProgressGauge<'a> {
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Out-of-range and NaN ratios are clamped.
    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        self
    }

    pub fn label<T: Into<Span<'a>>>(mut self, label: T) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn played_style<S: Into<Style>>(mut self, style: S) -> Self {
        self.played_style = style.into();
        self
    }

    pub fn remaining_style<S: Into<Style>>(mut self, style: S) -> Self {
        self.remaining_style = style.into();
        self
    }
}

fn partial_block(frac: f64) -> &'static str {
    match (frac * 8.0).round() as u16 {
        0 => " ",
        1 => symbols::block::ONE_EIGHTH,
        2 => symbols::block::ONE_QUARTER,
        3 => symbols::block::THREE_EIGHTHS,
        4 => symbols::block::HALF,
        5 => symbols::block::FIVE_EIGHTHS,
        6 => symbols::block::THREE_QUARTERS,
        7 => symbols::block::SEVEN_EIGHTHS,
        _ => symbols::block::FULL,
    }
}

impl Widget for ProgressGauge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(ref block) = self.block {
            block.render(area, buf);
        }
        let inner = self.block.as_ref().map_or(area, |b| b.inner(area));
        if inner.is_empty() {
            return;
        }

        let played = inner.width as f64 * self.ratio;
        let row = inner.top() + inner.height / 2;
        let label_width = self.label.as_ref().map_or(0, |l| l.width() as u16).min(inner.width);
        let label_col = inner.left() + (inner.width - label_width) / 2;

        for x in inner.left()..inner.right() {
            let pos = (x - inner.left()) as f64;
            let (symbol, style) = if pos + 1.0 <= played {
                (symbols::block::FULL, self.played_style)
            } else if pos < played {
                (partial_block(played - pos), self.played_style)
            } else {
                (" ", self.remaining_style)
            };
            let style = if label_width > 0 && x >= label_col && x < label_col + label_width {
                style.bg(style.fg.unwrap_or_default())
            } else {
                style
            };
            buf[(x, row)]
                .set_symbol(symbol)
                .set_fg(style.fg.unwrap_or_default())
                .set_bg(style.bg.unwrap_or_default());
        }

        if let Some(label) = self.label.as_ref() {
            buf.set_span(label_col, row, label, label_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn fills_in_proportion_to_ratio() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        ProgressGauge::default()
            .ratio(0.5)
            .played_style(Style::new().fg(Color::Red))
            .render(area, &mut buf);

        let full = (0..10)
            .filter(|x| buf[(*x, 0)].symbol() == symbols::block::FULL)
            .count();
        assert_eq!(full, 5);
    }

    #[test]
    fn clamps_bad_ratios() {
        assert_eq!(ProgressGauge::default().ratio(f64::NAN).ratio, 0.0);
        assert_eq!(ProgressGauge::default().ratio(3.0).ratio, 1.0);
    }
}
