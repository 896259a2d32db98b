use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, StatefulWidget, Widget, Wrap},
};
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

use crate::app::App;
use crate::store::Sender;
use crate::ui::style;

/// Renders the message log. User messages are right-aligned, bot messages
/// left-aligned, fallback replies in their own color. While a request is
/// outstanding the last line of the block is the processing spinner.
pub fn render_history(app: &mut App, area: Rect, buf: &mut Buffer) {
    let block = Block::bordered()
        .title("گفتگو")
        .title_alignment(Alignment::Center)
        .border_type(BorderType::Rounded);
    let inner = block.inner(area);
    block.render(area, buf);

    let (list_area, spinner_area) = if app.store.is_loading() && inner.height > 1 {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        (chunks[0], Some(chunks[1]))
    } else {
        (inner, None)
    };

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.store.messages() {
        let stamp = msg.timestamp.format("%H:%M").to_string();
        let alignment = match msg.sender {
            Sender::User => Alignment::Right,
            Sender::Bot => Alignment::Left,
        };
        lines.push(
            Line::from(vec![
                Span::styled(format!("{stamp} "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    msg.text.clone(),
                    style::message_style(msg.sender, msg.is_fallback),
                ),
            ])
            .alignment(alignment),
        );
        lines.push(Line::from(""));
    }

    let content = if lines.is_empty() {
        Text::from(Line::from(Span::styled(
            "گفتگویی وجود ندارد",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )))
    } else {
        Text::from(lines)
    };

    // Sync the scroll window: pinned follows the newest message, manual
    // offsets are clamped to what fits.
    let total = content.lines.len() as u16;
    app.chat_max_scroll = total.saturating_sub(list_area.height);
    if app.chat_pinned {
        app.chat_scroll = app.chat_max_scroll;
    } else {
        app.chat_scroll = app.chat_scroll.min(app.chat_max_scroll);
    }

    let history_widget = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    history_widget.render(list_area, buf);

    if let Some(spinner_area) = spinner_area {
        let throbber = Throbber::default()
            .label("در حال پردازش...")
            .style(Style::default().fg(Color::Yellow))
            .throbber_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .throbber_set(BRAILLE_SIX)
            .use_type(WhichUse::Spin);
        StatefulWidget::render(throbber, spinner_area, buf, &mut app.throbber_state);
    }
}
