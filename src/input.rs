use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Board-level actions available while no modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NewTask,
    EditSelected,
    FocusPrevColumn,
    FocusNextColumn,
    SelectPrevTask,
    SelectNextTask,
    PrevBoard,
    NextBoard,
    ToggleSidebar,
    ToggleTheme,
}

pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('n') | KeyCode::Char('a') => Some(Action::NewTask),
        KeyCode::Enter => Some(Action::EditSelected),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::FocusPrevColumn),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::FocusNextColumn),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevTask),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNextTask),
        KeyCode::Char('[') => Some(Action::PrevBoard),
        KeyCode::Char(']') => Some(Action::NextBoard),
        KeyCode::Char('s') => Some(Action::ToggleSidebar),
        KeyCode::Char('t') => Some(Action::ToggleTheme),
        _ => None,
    }
}

/// Key hints shown in the status line.
pub const HINTS: &str = "n new  enter edit  ←→↑↓ move  [ ] board  s sidebar  t theme  q quit";
