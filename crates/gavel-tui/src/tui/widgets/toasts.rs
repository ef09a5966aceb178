// Transient notifications stacked in the bottom-right corner, newest lowest.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use ratatui::Frame;

use gavel_core::protocol::NotificationLevel;

use crate::tui::ViewState;

const MAX_WIDTH: u16 = 60;

/// Rows kept clear at the bottom so toasts sit above the help bar.
const BOTTOM_MARGIN: u16 = 1;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let rows = area.height.saturating_sub(BOTTOM_MARGIN);
    for (i, toast) in state.toasts.iter().rev().enumerate() {
        let i = i as u16;
        if i >= rows {
            break;
        }
        let message = &toast.notification.message;
        let (icon, style) = level_style(toast.notification.level);
        let text = format!(" {icon} {message} ");
        let width = (text.chars().count() as u16).min(MAX_WIDTH).min(area.width);
        let toast_area = Rect {
            x: area.x + area.width - width,
            y: area.y + rows - 1 - i,
            width,
            height: 1,
        };
        frame.render_widget(Clear, toast_area);
        frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), toast_area);
    }
}

pub fn level_style(level: NotificationLevel) -> (&'static str, Style) {
    match level {
        NotificationLevel::Info => ("i", Style::default().fg(Color::Black).bg(Color::Cyan)),
        NotificationLevel::Success => ("✔", Style::default().fg(Color::Black).bg(Color::Green)),
        NotificationLevel::Error => (
            "✘",
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
    }
}
