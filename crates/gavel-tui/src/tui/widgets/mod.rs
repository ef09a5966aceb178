// One module per screen zone or overlay.

pub mod bid_history;
pub mod help_bar;
pub mod players;
pub mod quit_confirm;
pub mod sale_form;
pub mod sold_stamp;
pub mod spotlight;
pub mod status_bar;
pub mod summary;
pub mod teams;
pub mod toasts;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
