// Spotlight: the player on the block, the leading bid, and the countdown.
//
// +- On the block -----------------------------+
// | ASHA                                       |
// | Batters | Base ₹10,000                      |
// | Age 27 | Batter | Opener | ex Harbour XI    |
// | Matches 40 | Runs 1,250                     |
// |                                            |
// | Current bid ₹18,000 by Lions               |
// | [#########-----------  34s ]               |
// +--------------------------------------------+

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use gavel_core::model::Player;
use gavel_core::protocol::{format_price, ViewMode};

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" On the block ")
        .border_style(Style::default().fg(Color::Yellow));

    let Some(player) = &state.snapshot.current_player else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  Waiting for the next player...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let alignment = match state.view_mode {
        ViewMode::Panel => Alignment::Left,
        ViewMode::Projector => Alignment::Center,
    };
    let paragraph = Paragraph::new(player_lines(player, state)).alignment(alignment);
    frame.render_widget(paragraph, rows[0]);
    render_timer(frame, rows[1], state);
}

/// Content lines for the player card.
pub fn player_lines(player: &Player, state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let name = match state.view_mode {
        ViewMode::Panel => player.name.clone(),
        ViewMode::Projector => player.name.to_uppercase(),
    };

    let mut lines = vec![Line::from(Span::styled(
        name,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];

    let category = snapshot
        .current_category
        .as_ref()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Uncategorised".to_string());
    lines.push(Line::from(vec![
        Span::styled(category, Style::default().fg(Color::Cyan)),
        Span::styled(" | Base ", Style::default().fg(Color::Gray)),
        Span::raw(state.price(player.base_price)),
    ]));

    let details = detail_parts(player);
    if !details.is_empty() {
        lines.push(Line::from(Span::styled(
            details.join(" | "),
            Style::default().fg(Color::Gray),
        )));
    }

    if let Some(stats) = &player.stats {
        let present = stats.present();
        if !present.is_empty() {
            let text = present
                .iter()
                .map(|(label, value)| format!("{} {}", label, format_price("", u64::from(*value))))
                .collect::<Vec<_>>()
                .join(" | ");
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Gray))));
        }
    }

    lines.push(Line::default());
    lines.push(bid_line(state));
    lines
}

fn detail_parts(player: &Player) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(age) = player.age {
        parts.push(format!("Age {age}"));
    }
    if let Some(position) = &player.position {
        parts.push(position.clone());
    }
    if let Some(specialty) = &player.specialty {
        parts.push(specialty.clone());
    }
    if let Some(previous) = &player.previous_team {
        parts.push(format!("ex {previous}"));
    }
    parts
}

fn bid_line(state: &ViewState) -> Line<'static> {
    let snapshot = &state.snapshot;
    match snapshot.current_bid {
        Some(bid) => {
            let mut spans = vec![
                Span::styled("Current bid ", Style::default().fg(Color::Gray)),
                Span::styled(
                    state.price(bid),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            if let Some(team) = &snapshot.leading_team {
                spans.push(Span::styled(" by ", Style::default().fg(Color::Gray)));
                spans.push(Span::styled(
                    team.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            "No bids yet",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

fn render_timer(frame: &mut Frame, area: Rect, state: &ViewState) {
    let timer = state.timer;
    if state.timer_expired {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "TIME UP",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let label = if timer.active {
        format!("{}s", timer.remaining)
    } else {
        format!("{}s paused", timer.remaining)
    };
    let gauge = Gauge::default()
        .ratio(timer_ratio(timer.remaining, timer.duration))
        .label(label)
        .gauge_style(Style::default().fg(timer_color(timer.remaining)));
    frame.render_widget(gauge, area);
}

pub fn timer_ratio(remaining: u32, duration: u32) -> f64 {
    if duration == 0 {
        return 0.0;
    }
    (f64::from(remaining) / f64::from(duration)).clamp(0.0, 1.0)
}

pub fn timer_color(remaining: u32) -> Color {
    match remaining {
        0..=10 => Color::Red,
        11..=20 => Color::Yellow,
        _ => Color::Green,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use gavel_core::protocol::TimerView;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn draw(state: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 11)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn lines_cover_player_card() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let player = state.snapshot.current_player.clone().unwrap();
        let lines: Vec<String> = player_lines(&player, &state).iter().map(line_text).collect();
        assert_eq!(lines[0], "Asha");
        assert_eq!(lines[1], "Batters | Base ₹10,000");
        assert_eq!(lines[2], "Age 27 | Batter | Opener | ex Harbour XI");
        assert_eq!(lines[3], "Matches 40 | Runs 1,250");
        assert_eq!(lines.last().unwrap(), "Current bid ₹18,000 by Lions");
    }

    #[test]
    fn projector_shouts_the_name() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        state.view_mode = ViewMode::Projector;
        let player = state.snapshot.current_player.clone().unwrap();
        assert_eq!(line_text(&player_lines(&player, &state)[0]), "ASHA");
    }

    #[test]
    fn no_bid_line() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        state.snapshot.current_bid = None;
        state.snapshot.current_category = None;
        let player = state.snapshot.current_player.clone().unwrap();
        let lines: Vec<String> = player_lines(&player, &state).iter().map(line_text).collect();
        assert!(lines[1].starts_with("Uncategorised"));
        assert_eq!(lines.last().unwrap(), "No bids yet");
    }

    #[test]
    fn timer_helpers() {
        assert_eq!(timer_ratio(30, 60), 0.5);
        assert_eq!(timer_ratio(5, 0), 0.0);
        assert_eq!(timer_color(60), Color::Green);
        assert_eq!(timer_color(15), Color::Yellow);
        assert_eq!(timer_color(3), Color::Red);
    }

    #[test]
    fn renders_waiting_without_player() {
        let state = ViewState::default();
        assert!(draw(&state).contains("Waiting for the next player"));
    }

    #[test]
    fn renders_countdown_and_expiry() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        state.timer = TimerView {
            remaining: 42,
            duration: 60,
            active: true,
        };
        let text = draw(&state);
        assert!(text.contains("Asha"));
        assert!(text.contains("42s"));

        state.timer_expired = true;
        assert!(draw(&state).contains("TIME UP"));
    }
}
