use crate::{
    audio::commands::PlayerCommand,
    ui::{message::AppMessage, state::Tab},
};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key(key: KeyEvent, searching: bool) -> Option<AppMessage> {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            return Some(AppMessage::Quit);
        }
        if searching {
            return Self::handle_search_key(key);
        }

        let player = |cmd| Some(AppMessage::Player(cmd));
        match key.code {
            KeyCode::Char('q') => Some(AppMessage::Quit),
            KeyCode::Char(' ') => player(PlayerCommand::TogglePlayPause),
            KeyCode::Char('n') => player(PlayerCommand::Next),
            KeyCode::Char('p') => player(PlayerCommand::Previous),
            KeyCode::Char('+') | KeyCode::Char('=') => player(PlayerCommand::VolumeUp),
            KeyCode::Char('-') => player(PlayerCommand::VolumeDown),
            KeyCode::Char('H') | KeyCode::Left => Some(AppMessage::SeekBackward),
            KeyCode::Char('L') | KeyCode::Right => Some(AppMessage::SeekForward),
            KeyCode::Char('r') => player(PlayerCommand::CycleRepeat),
            KeyCode::Char('s') => player(PlayerCommand::ToggleShuffle),
            KeyCode::Char('m') => player(PlayerCommand::ToggleMute),
            KeyCode::Char('f') => player(PlayerCommand::ToggleMobileExpanded),
            KeyCode::Char('x') => player(PlayerCommand::Close),
            KeyCode::Char('j') | KeyCode::Down => Some(AppMessage::MoveSelection(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(AppMessage::MoveSelection(-1)),
            KeyCode::PageDown => Some(AppMessage::MoveSelection(10)),
            KeyCode::PageUp => Some(AppMessage::MoveSelection(-10)),
            KeyCode::Enter => Some(AppMessage::PlaySelected),
            KeyCode::Char('l') => Some(AppMessage::ToggleLike),
            KeyCode::Char('c') => Some(AppMessage::ToggleCart),
            KeyCode::Char('t') => Some(AppMessage::CycleLicense),
            KeyCode::Char('b') => Some(AppMessage::Checkout),
            KeyCode::Char('R') => Some(AppMessage::Refresh),
            KeyCode::Char('/') => Some(AppMessage::OpenSearch),
            KeyCode::Esc => Some(AppMessage::CollapseTransport),
            KeyCode::Tab => Some(AppMessage::NextTab),
            KeyCode::BackTab => Some(AppMessage::PreviousTab),
            KeyCode::Char(c) => Tab::ALL
                .into_iter()
                .find(|tab| tab.key() == c)
                .map(AppMessage::SelectTab),
            _ => None,
        }
    }

    fn handle_search_key(key: KeyEvent) -> Option<AppMessage> {
        match key.code {
            KeyCode::Esc => Some(AppMessage::CancelSearch),
            KeyCode::Enter => Some(AppMessage::SubmitSearch),
            KeyCode::Backspace => Some(AppMessage::SearchBackspace),
            KeyCode::Char(c) => Some(AppMessage::SearchInput(c)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_transport_keys() {
        assert!(matches!(
            InputHandler::handle_key(key(KeyCode::Char(' ')), false),
            Some(AppMessage::Player(PlayerCommand::TogglePlayPause))
        ));
        assert!(matches!(
            InputHandler::handle_key(key(KeyCode::Char('3')), false),
            Some(AppMessage::SelectTab(Tab::Likes))
        ));
    }

    #[test]
    fn search_prompt_captures_letters() {
        assert!(matches!(
            InputHandler::handle_key(key(KeyCode::Char('q')), true),
            Some(AppMessage::SearchInput('q'))
        ));
        assert!(matches!(
            InputHandler::handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(AppMessage::Quit)
        ));
    }
}
