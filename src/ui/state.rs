#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Catalog,
    Cart,
    Likes,
    Purchases,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Catalog, Tab::Cart, Tab::Likes, Tab::Purchases];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Catalog => "Catalog",
            Tab::Cart => "Cart",
            Tab::Likes => "Likes",
            Tab::Purchases => "Purchases",
        }
    }

    pub fn key(self) -> char {
        match self {
            Tab::Catalog => '1',
            Tab::Cart => '2',
            Tab::Likes => '3',
            Tab::Purchases => '4',
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tab: Tab,
    pub selected: usize,
    /// `Some` while the search prompt is open.
    pub search_input: Option<String>,
    pub last_query: Option<String>,
    pub catalog_loading: bool,
    pub status_message: Option<String>,
    pub has_focus: bool,
    pub tick: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            has_focus: true,
            ..Default::default()
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = 0;
        }
    }

    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_wrap_both_ways() {
        assert_eq!(Tab::Purchases.next(), Tab::Catalog);
        assert_eq!(Tab::Catalog.previous(), Tab::Purchases);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut ui = UiState::new();
        ui.move_selection(-1, 3);
        assert_eq!(ui.selected, 0);
        ui.move_selection(10, 3);
        assert_eq!(ui.selected, 2);
        ui.select_tab(Tab::Cart);
        assert_eq!(ui.selected, 0);
    }
}
