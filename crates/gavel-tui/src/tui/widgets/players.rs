// Player list with status filter and selection.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use gavel_core::model::{find_team, Player, PlayerStatus};

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let visible = state.visible_players();
    let title = format!(
        " Players [{}] ({}) ",
        state.player_filter.label(),
        visible.len()
    );

    let items: Vec<ListItem> = visible
        .iter()
        .map(|player| ListItem::new(player_line(player, state)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !visible.is_empty() {
        list_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn status_marker(status: PlayerStatus) -> (&'static str, Color) {
    match status {
        PlayerStatus::Available => ("○", Color::White),
        PlayerStatus::Current => ("●", Color::Yellow),
        PlayerStatus::Sold => ("✔", Color::Green),
        PlayerStatus::Unsold => ("✘", Color::Red),
    }
}

pub fn player_line(player: &Player, state: &ViewState) -> Line<'static> {
    let (marker, color) = status_marker(player.status);
    let mut spans = vec![
        Span::styled(format!("{marker} "), Style::default().fg(color)),
        Span::styled(player.name.clone(), Style::default().fg(Color::White)),
        Span::styled(
            format!("  {}", state.price(player.base_price)),
            Style::default().fg(Color::Gray),
        ),
    ];

    if player.status == PlayerStatus::Sold {
        let team = player
            .sold_to_team_id
            .as_deref()
            .and_then(|id| find_team(&state.snapshot.teams, id))
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "?".to_string());
        let price = player
            .sold_price
            .map(|p| state.price(p))
            .unwrap_or_else(|| "-".to_string());
        spans.push(Span::styled(
            format!("  -> {team} {price}"),
            Style::default().fg(Color::Green),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use crate::tui::PlayerFilter;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn sold_player_shows_buyer() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let chen = state.snapshot.players[2].clone();
        assert_eq!(
            line_text(&player_line(&chen, &state)),
            "✔ Chen  ₹10,000  -> Tigers ₹42,000"
        );
        let bilal = state.snapshot.players[1].clone();
        assert_eq!(line_text(&player_line(&bilal, &state)), "○ Bilal  ₹10,000");
    }

    #[test]
    fn renders_filtered_title() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        state.player_filter = PlayerFilter::Unsold;
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Players [Unsold] (1)"));
        assert!(text.contains("Dev"));
        assert!(!text.contains("Bilal"));
    }

    #[test]
    fn renders_empty_list() {
        let state = ViewState::default();
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("(0)"));
    }
}
