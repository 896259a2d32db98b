pub mod history;
pub mod launcher;
pub mod panel;
pub mod style;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::app::App;

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.store.is_open() {
            panel::render_panel(self, area, buf);
        } else {
            launcher::render_launcher(self, area, buf);
        }
    }
}
