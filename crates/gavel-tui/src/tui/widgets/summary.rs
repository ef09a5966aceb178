// Auction-wide summary strip.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(summary_line(state))
        .block(Block::default().borders(Borders::ALL).title(" Summary "));
    frame.render_widget(paragraph, area);
}

pub fn summary_line(state: &ViewState) -> Line<'static> {
    let summary = &state.snapshot.summary;
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));
    let value = |text: String, color: Color| {
        Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };

    let mut spans = vec![
        label(" Players "),
        value(summary.total_players.to_string(), Color::White),
        label("  Sold "),
        value(summary.sold.to_string(), Color::Green),
        label("  Unsold "),
        value(summary.unsold.to_string(), Color::Red),
        label("  Available "),
        value(summary.available.to_string(), Color::White),
        label("  Spent "),
        value(state.price(summary.total_spent), Color::Yellow),
    ];
    if let Some(top) = &summary.highest_sale {
        spans.push(label("  Top "));
        spans.push(value(
            format!("{} {}", top.player_name, state.price(top.price)),
            Color::Yellow,
        ));
    }
    if let Some(average) = summary.average_sale {
        spans.push(label("  Avg "));
        spans.push(value(state.price(average), Color::White));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::live_snapshot;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn summary_of_live_auction() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        assert_eq!(
            text(&summary_line(&state)),
            " Players 4  Sold 1  Unsold 1  Available 1  Spent ₹42,000  Top Chen ₹42,000  Avg ₹42,000"
        );
    }

    #[test]
    fn summary_before_any_sale() {
        let state = ViewState::default();
        assert_eq!(
            text(&summary_line(&state)),
            " Players 0  Sold 0  Unsold 0  Available 0  Spent ₹0"
        );
    }
}
