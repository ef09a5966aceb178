// Help bar: key hints for the current input mode.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

const NORMAL_KEYS: &[(&str, &str)] = &[
    ("s/p", "start/pause"),
    ("n", "random"),
    ("Enter", "put up"),
    ("b", "sell"),
    ("F", "finalize"),
    ("d", "direct"),
    ("u/a", "unsold/avail"),
    ("t/Spc/r", "timer"),
    ("v", "filter"),
    ("f", "projector"),
    ("R", "refresh"),
    ("e", "export"),
    ("q", "quit"),
];

const FORM_KEYS: &[(&str, &str)] = &[
    ("[ ]", "team"),
    ("0-9", "price"),
    ("Bksp", "delete"),
    ("Enter", "confirm"),
    ("Esc", "cancel"),
];

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph =
        Paragraph::new(help_line(state)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn help_line(state: &ViewState) -> Line<'static> {
    let keys = if state.sale_form.is_some() {
        FORM_KEYS
    } else {
        NORMAL_KEYS
    };
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (key, action) in keys {
        spans.push(Span::styled(
            format!(" {key}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(":{action}"), Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::{SaleForm, SaleTarget};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn normal_hints() {
        let state = ViewState::default();
        let line = text(&help_line(&state));
        assert!(line.starts_with(" s/p:start/pause n:random"));
        assert!(line.ends_with(" q:quit"));
    }

    #[test]
    fn form_hints_replace_normal_ones() {
        let mut state = ViewState::default();
        state.sale_form = Some(SaleForm {
            target: SaleTarget::Current,
            player_name: "Asha".into(),
            team: None,
            price: String::new(),
        });
        let line = text(&help_line(&state));
        assert!(line.contains("Esc:cancel"));
        assert!(!line.contains("q:quit"));
    }
}
