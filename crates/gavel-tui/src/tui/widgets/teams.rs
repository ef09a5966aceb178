// Teams table: spend, remaining purse, squad size, and safe bid.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use gavel_core::model::{Team, TeamSafeBid};

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title(" Teams ");
    let teams = &state.snapshot.teams;

    if teams.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  No teams loaded",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec!["Team", "Spent", "Remaining", "Squad", "Safe bid"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let leading = state.snapshot.leading_team.as_deref();
    let rows: Vec<Row> = teams
        .iter()
        .map(|team| {
            let style = if leading == Some(team.name.as_str()) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(team_cells(team, &state.snapshot.safe_bids, state)).style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(10),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(11),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

pub fn team_cells(team: &Team, safe_bids: &[TeamSafeBid], state: &ViewState) -> Vec<String> {
    let safe_bid = safe_bid_for(safe_bids, &team.id)
        .map(|amount| state.price(amount))
        .unwrap_or_else(|| "-".to_string());
    vec![
        team.name.clone(),
        state.price(team.spent),
        state.price(team.remaining),
        format!("{}/{}", team.players_count, team.max_squad_size),
        safe_bid,
    ]
}

pub fn safe_bid_for(safe_bids: &[TeamSafeBid], team_id: &str) -> Option<u64> {
    safe_bids
        .iter()
        .find(|s| s.team_id == team_id)
        .map(|s| s.safe_bid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn cells_include_safe_bid_when_known() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let snapshot = state.snapshot.clone();
        let lions = team_cells(&snapshot.teams[1], &snapshot.safe_bids, &state);
        assert_eq!(
            lions,
            vec!["Lions", "₹120,000", "₹380,000", "4/15", "₹300,000"]
        );
        let tigers = team_cells(&snapshot.teams[0], &snapshot.safe_bids, &state);
        assert_eq!(tigers[4], "-");
    }

    #[test]
    fn renders_table() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let mut terminal = Terminal::new(TestBackend::new(70, 6)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Safe bid"));
        assert!(text.contains("Tigers"));
        assert!(text.contains("Lions"));
    }

    #[test]
    fn renders_placeholder_without_teams() {
        let state = ViewState::default();
        let mut terminal = Terminal::new(TestBackend::new(40, 4)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("No teams loaded"));
    }
}
