// Bid history for the current round, newest first.

use chrono::Local;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use gavel_core::model::BidRecord;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let bids = &state.snapshot.bid_history;
    let title = format!(" Bids ({}) ", bids.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    let lines: Vec<Line> = if bids.is_empty() {
        vec![Line::from(Span::styled(
            "  No bids yet",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        bids.iter()
            .rev()
            .enumerate()
            .map(|(i, bid)| bid_line(bid, i == 0, state))
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn bid_line(bid: &BidRecord, newest: bool, state: &ViewState) -> Line<'static> {
    let style = if newest {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![
        Span::styled(format!("{:<16}", bid.team_name), style),
        Span::styled(format!("{:>12}", state.price(bid.amount)), style),
    ];
    if let Some(at) = bid.timestamp {
        spans.push(Span::styled(
            format!("  {}", at.with_timezone(&Local).format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(state: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(50, 6)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn newest_bid_first() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let text = draw(&state);
        let lions = text.find("Lions").unwrap();
        let tigers = text.find("Tigers").unwrap();
        assert!(lions < tigers);
        assert!(text.contains("Bids (2)"));
        assert!(text.contains("₹18,000"));
    }

    #[test]
    fn newest_bid_is_bold() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let bid = state.snapshot.bid_history[0].clone();
        let line = bid_line(&bid, true, &state);
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans.len(), 2);
    }

    #[test]
    fn empty_history() {
        assert!(draw(&ViewState::default()).contains("No bids yet"));
    }
}
