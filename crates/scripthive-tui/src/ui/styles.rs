use ratatui::style::{Color, Modifier, Style};

use scripthive_core::models::StatusKind;

use crate::app::NoticeKind;

// Color palette
pub const PRIMARY: Color = Color::Rgb(214, 160, 48);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(96, 144, 208);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const WARNING: Color = Color::Rgb(208, 176, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(56, 48, 32);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn warning_style() -> Style {
    Style::default().fg(WARNING)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn input_style(focused: bool) -> Style {
    if focused {
        selected_style()
    } else {
        list_item_style()
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn stat_value_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

/// Color for a project or transaction status.
pub fn status_style(kind: StatusKind) -> Style {
    match kind {
        StatusKind::Success => success_style(),
        StatusKind::Pending => warning_style(),
        StatusKind::Failed => error_style(),
        StatusKind::Other => muted_style(),
    }
}

pub fn notice_style(kind: NoticeKind) -> Style {
    match kind {
        NoticeKind::Info => highlight_style(),
        NoticeKind::Success => success_style(),
        NoticeKind::Error => error_style(),
    }
}
