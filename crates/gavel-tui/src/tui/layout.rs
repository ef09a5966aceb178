// Screen layout for the two view modes.
//
// Panel (operator):
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Spotlight (11 rows)      | Teams (45%)            |
// +-------------------------+------------------------+
// | Bid History (fill)       | Players (55%)          |
// +-------------------------+------------------------+
// | Summary (3 rows)                                  |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// Projector (audience): status, a large spotlight, then bid history and
// teams side by side, then the summary. No player list, no help bar.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use gavel_core::protocol::ViewMode;

/// Height of the spotlight in panel mode.
const PANEL_SPOTLIGHT_HEIGHT: u16 = 11;

#[derive(Debug, Clone)]
pub struct AppLayout {
    pub status_bar: Rect,
    /// The player on the block, the leading bid, and the countdown.
    pub spotlight: Rect,
    pub bid_history: Rect,
    pub teams: Rect,
    /// Only in panel mode.
    pub players: Option<Rect>,
    pub summary: Rect,
    /// Only in panel mode.
    pub help_bar: Option<Rect>,
}

pub fn build_layout(area: Rect, mode: ViewMode) -> AppLayout {
    match mode {
        ViewMode::Panel => panel_layout(area),
        ViewMode::Projector => projector_layout(area),
    }
}

fn panel_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(10),   // middle
            Constraint::Length(3), // summary
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(PANEL_SPOTLIGHT_HEIGHT),
            Constraint::Min(3),
        ])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(columns[1]);

    AppLayout {
        status_bar: vertical[0],
        spotlight: left[0],
        bid_history: left[1],
        teams: right[0],
        players: Some(right[1]),
        summary: vertical[2],
        help_bar: Some(vertical[3]),
    }
}

fn projector_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // status bar
            Constraint::Min(12),    // spotlight
            Constraint::Length(12), // bids + teams
            Constraint::Length(3),  // summary
        ])
        .split(area);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[2]);

    AppLayout {
        status_bar: vertical[0],
        spotlight: vertical[1],
        bid_history: bottom[0],
        teams: bottom[1],
        players: None,
        summary: vertical[3],
        help_bar: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 160, 50)
    }

    fn fits(rect: Rect, area: Rect) -> bool {
        rect.x >= area.x
            && rect.y >= area.y
            && rect.x + rect.width <= area.x + area.width
            && rect.y + rect.height <= area.y + area.height
    }

    #[test]
    fn panel_has_every_zone() {
        let layout = build_layout(test_area(), ViewMode::Panel);
        let players = layout.players.expect("panel shows players");
        let help_bar = layout.help_bar.expect("panel shows help");
        let rects = [
            ("status_bar", layout.status_bar),
            ("spotlight", layout.spotlight),
            ("bid_history", layout.bid_history),
            ("teams", layout.teams),
            ("players", players),
            ("summary", layout.summary),
            ("help_bar", help_bar),
        ];
        for (name, rect) in &rects {
            assert!(rect.width > 0 && rect.height > 0, "{name} has zero area: {rect:?}");
            assert!(fits(*rect, test_area()), "{name} overflows: {rect:?}");
        }
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(help_bar.height, 1);
        assert_eq!(layout.spotlight.height, PANEL_SPOTLIGHT_HEIGHT);
    }

    #[test]
    fn panel_columns() {
        let layout = build_layout(test_area(), ViewMode::Panel);
        let players = layout.players.unwrap();
        assert!(layout.spotlight.x < layout.teams.x);
        assert!(layout.spotlight.y < layout.bid_history.y);
        assert!(layout.teams.y < players.y);
        assert_eq!(layout.teams.width, players.width);
    }

    #[test]
    fn projector_drops_operator_zones() {
        let layout = build_layout(test_area(), ViewMode::Projector);
        assert!(layout.players.is_none());
        assert!(layout.help_bar.is_none());
        assert!(layout.spotlight.height >= 12);
        assert_eq!(layout.spotlight.width, test_area().width);
        assert_eq!(layout.bid_history.y, layout.teams.y);
        assert!(layout.bid_history.width < layout.teams.width);
        assert_eq!(layout.summary.height, 3);
    }

    #[test]
    fn small_area_does_not_panic() {
        for mode in [ViewMode::Panel, ViewMode::Projector] {
            let area = Rect::new(0, 0, 10, 5);
            let layout = build_layout(area, mode);
            assert!(fits(layout.status_bar, area));
            assert!(fits(layout.summary, area));
        }
    }
}
