// Sale form overlay: pick a team and type a price.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::{SaleForm, SaleTarget, ViewState};

const DIALOG_WIDTH: u16 = 52;
const DIALOG_HEIGHT: u16 = 8;

pub fn render(frame: &mut Frame, area: Rect, form: &SaleForm, state: &ViewState) {
    let dialog_area = super::centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let title = match form.target {
        SaleTarget::Current => " Record sale ",
        SaleTarget::Direct { .. } => " Direct sale ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(form_lines(form, state))
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

pub fn form_lines(form: &SaleForm, state: &ViewState) -> Vec<Line<'static>> {
    let field = |name: &'static str| Span::styled(name, Style::default().fg(Color::Gray));
    let input = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let team = form
        .team
        .and_then(|i| state.snapshot.teams.get(i))
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "(choose)".to_string());

    let price = match form.price_value() {
        Some(amount) => state.price(amount),
        None => format!("{}_", state.currency),
    };

    vec![
        Line::from(vec![
            field(" Player  "),
            Span::styled(form.player_name.clone(), input),
        ]),
        Line::from(vec![
            field(" Team    "),
            Span::styled(format!("< {team} >"), input.fg(Color::Yellow)),
        ]),
        Line::from(vec![field(" Price   "), Span::styled(price, input)]),
        Line::default(),
        Line::from(Span::styled(
            " [ ] team  0-9 price  Enter confirm  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn form(team: Option<usize>, price: &str) -> SaleForm {
        SaleForm {
            target: SaleTarget::Current,
            player_name: "Asha".into(),
            team,
            price: price.into(),
        }
    }

    #[test]
    fn lines_show_choice_and_price() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let lines = form_lines(&form(Some(1), "18000"), &state);
        assert_eq!(text(&lines[0]), " Player  Asha");
        assert_eq!(text(&lines[1]), " Team    < Lions >");
        assert_eq!(text(&lines[2]), " Price   ₹18,000");
    }

    #[test]
    fn unfilled_fields() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let lines = form_lines(&form(None, ""), &state);
        assert_eq!(text(&lines[1]), " Team    < (choose) >");
        assert_eq!(text(&lines[2]), " Price   ₹_");
    }

    #[test]
    fn direct_sale_title() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let mut direct = form(Some(0), "5000");
        direct.target = SaleTarget::Direct {
            player_id: "p4".into(),
        };
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &direct, &state))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Direct sale"));
        assert!(text.contains("Tigers"));
    }
}
