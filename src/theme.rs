use ratatui::style::{Color, Modifier, Style};

use crate::task::Status;

/// Palette for one of the two display themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub focused_border: Color,
    pub active_board: Color,
    pub error: Color,
}

impl Theme {
    pub const DARK: Theme = Theme {
        bg: Color::Reset,
        fg: Color::Reset,
        dim: Color::DarkGray,
        border: Color::DarkGray,
        focused_border: Color::Cyan,
        active_board: Color::Cyan,
        error: Color::Red,
    };

    pub const LIGHT: Theme = Theme {
        bg: Color::White,
        fg: Color::Black,
        dim: Color::Gray,
        border: Color::Gray,
        focused_border: Color::Blue,
        active_board: Color::Blue,
        error: Color::Red,
    };

    pub fn for_prefs(light: bool) -> Self {
        if light {
            Self::LIGHT
        } else {
            Self::DARK
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn border(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.focused_border } else { self.border })
    }

    pub fn selected(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    /// Column header dot colour.
    pub fn dot(status: Status) -> Color {
        match status {
            Status::Todo => Color::Cyan,
            Status::Doing => Color::Magenta,
            Status::Done => Color::Green,
        }
    }
}
