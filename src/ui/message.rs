use crate::{audio::commands::PlayerCommand, ui::state::Tab};

#[derive(Debug, Clone)]
pub enum AppMessage {
    Quit,
    Player(PlayerCommand),
    SeekForward,
    SeekBackward,

    // Navigation
    SelectTab(Tab),
    NextTab,
    PreviousTab,
    MoveSelection(isize),
    PlaySelected,
    CollapseTransport,

    // Collections
    ToggleLike,
    ToggleCart,
    CycleLicense,
    Checkout,
    Refresh,

    // Search prompt
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    CancelSearch,
}
