use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Stylize},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::app::App;

/// The collapsed state: a small bubble in the bottom-right corner, the
/// terminal stand-in for the floating toggle button.
pub fn render_launcher(app: &App, area: Rect, buf: &mut Buffer) {
    let width = area.width.min(40);
    let height = area.height.min(3);
    let bubble = Rect {
        x: area.right().saturating_sub(width),
        y: area.bottom().saturating_sub(height),
        width,
        height,
    };

    let label = if app.backend_online == Some(false) {
        "💬 چت بات (آفلاین)"
    } else {
        "💬 چت بات"
    };

    let hint = Paragraph::new(label)
        .block(
            Block::bordered()
                .title("Enter: باز کردن چت • q: خروج")
                .title_alignment(Alignment::Center)
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Green)
        .alignment(Alignment::Center);
    hint.render(bubble, buf);
}
