use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::app::App;
use crate::ui::{history, style};

/// The open chat panel: title, message history, input line, help bar.
pub fn render_panel(app: &mut App, area: Rect, buf: &mut Buffer) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Chat history
            Constraint::Length(3), // Input line
            Constraint::Length(3), // Help
        ])
        .split(area);

    render_title(app, main_layout[0], buf);
    history::render_history(app, main_layout[1], buf);
    render_input(app, main_layout[2], buf);
    render_help(app, main_layout[3], buf);
}

fn render_title(app: &App, area: Rect, buf: &mut Buffer) {
    let offline = app.backend_online == Some(false);
    let mut text = String::from("🤖 پشتیبان هوشمند زیمر");
    if offline {
        text.push_str(" (آفلاین)");
    }

    let title = Paragraph::new(text)
        .block(
            Block::bordered()
                .title("چت بات")
                .title_alignment(Alignment::Center)
                .border_type(BorderType::Rounded),
        )
        .fg(if offline { Color::Red } else { Color::Green })
        .alignment(Alignment::Center);
    title.render(area, buf);
}

fn render_input(app: &App, area: Rect, buf: &mut Buffer) {
    let input_text = format!("> {}", app.input);
    let enabled = app.input_focused && !app.store.is_loading();

    let input_widget = Paragraph::new(input_text)
        .block(
            Block::bordered()
                .title("پیام خود را بنویسید...")
                .border_type(BorderType::Rounded),
        )
        .style(style::dim_unless_focused(
            enabled,
            Style::default().fg(Color::Yellow),
        ));
    input_widget.render(area, buf);
}

fn render_help(app: &App, area: Rect, buf: &mut Buffer) {
    let help_text = if app.store.is_loading() {
        "در حال پردازش..."
    } else {
        "Enter: ارسال • ↑↓: پیمایش • Ctrl+L: پاک کردن • Esc: بستن"
    };

    let help = Paragraph::new(help_text)
        .block(
            Block::bordered()
                .title("راهنما")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow)
        .alignment(Alignment::Center);
    help.render(area, buf);
}
