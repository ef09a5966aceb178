// SOLD stamp overlay, shown while the transition lock holds the sale on
// screen.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

use gavel_core::protocol::{SaleDisplay, ViewMode};

use super::centered_rect;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, stamp: &SaleDisplay, state: &ViewState) {
    let (width, height) = match state.view_mode {
        ViewMode::Panel => (46, 7),
        ViewMode::Projector => (64, 9),
    };
    let stamp_area = centered_rect(width, height, area);
    frame.render_widget(Clear, stamp_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(stamp_lines(stamp, state))
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, stamp_area);
}

pub fn stamp_lines(stamp: &SaleDisplay, state: &ViewState) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "S O L D !",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(
                stamp.player_name.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to ", Style::default().fg(Color::Gray)),
            Span::styled(
                stamp.team_name.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            state.price(stamp.price),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if state.view_mode == ViewMode::Projector {
        lines.insert(0, Line::default());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, stamp};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn renders_sale_over_the_screen() {
        let state = ViewState::default();
        let stamp = stamp();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &stamp, &state))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("S O L D !"));
        assert!(text.contains("Asha to Lions"));
        assert!(text.contains("₹18,000"));
    }

    #[test]
    fn projector_pads_the_stamp() {
        let mut state = ViewState::default();
        let panel = stamp_lines(&stamp(), &state).len();
        state.view_mode = ViewMode::Projector;
        assert_eq!(stamp_lines(&stamp(), &state).len(), panel + 1);
    }
}
