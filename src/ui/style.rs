use ratatui::style::{Color, Style, Stylize};

use crate::store::Sender;

pub fn dim_unless_focused(is_focused: bool, style: Style) -> Style {
    if is_focused {
        style.bold()
    } else {
        style.dim().italic()
    }
}

/// Per-message palette: user messages cyan, primary bot replies green,
/// fallback replies yellow so they read differently at a glance.
pub fn message_style(sender: Sender, is_fallback: bool) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Cyan),
        Sender::Bot if is_fallback => Style::default().fg(Color::Yellow),
        Sender::Bot => Style::default().fg(Color::Green),
    }
}
