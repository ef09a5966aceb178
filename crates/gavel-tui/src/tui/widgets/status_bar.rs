// Status bar: event name, auction status, data freshness, view mode.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use gavel_core::model::AuctionStatus;
use gavel_core::protocol::{ControlSnapshot, ViewMode};

use crate::tui::ViewState;

/// Layout: [GAVEL] [event] | [status] | [freshness] | [mode]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let separator = || Span::styled(" | ", Style::default().fg(Color::Gray));

    let mut spans = vec![
        Span::styled(
            " GAVEL ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            snapshot.event_name.as_deref().unwrap_or("Loading event...").to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        separator(),
        Span::styled(
            snapshot.status.label(),
            Style::default().fg(status_color(snapshot.status)),
        ),
        separator(),
    ];

    let (freshness_text, freshness_color) = freshness(snapshot);
    spans.push(Span::styled(freshness_text, Style::default().fg(freshness_color)));
    spans.push(separator());
    spans.push(Span::styled(
        mode_label(state.view_mode),
        Style::default().fg(Color::Cyan),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn status_color(status: AuctionStatus) -> Color {
    match status {
        AuctionStatus::NotStarted => Color::Gray,
        AuctionStatus::InProgress => Color::Green,
        AuctionStatus::Paused => Color::Yellow,
        AuctionStatus::Completed => Color::Blue,
    }
}

/// How current the polled data is.
pub fn freshness(snapshot: &ControlSnapshot) -> (String, Color) {
    match (snapshot.stale, snapshot.last_poll_ok) {
        (true, Some(at)) => (format!("STALE since {}", clock(at)), Color::Red),
        (true, None) => ("STALE".to_string(), Color::Red),
        (false, Some(at)) => (format!("Updated {}", clock(at)), Color::Green),
        (false, None) => ("Connecting...".to_string(), Color::Yellow),
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub fn mode_label(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Panel => "Panel",
        ViewMode::Projector => "Projector",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_fixtures::{buffer_text, live_snapshot};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn status_colors() {
        assert_eq!(status_color(AuctionStatus::InProgress), Color::Green);
        assert_eq!(status_color(AuctionStatus::Paused), Color::Yellow);
        assert_eq!(status_color(AuctionStatus::NotStarted), Color::Gray);
    }

    #[test]
    fn freshness_states() {
        let mut snapshot = ControlSnapshot::default();
        assert_eq!(freshness(&snapshot), ("Connecting...".to_string(), Color::Yellow));

        snapshot.last_poll_ok = Some(Utc::now());
        let (text, color) = freshness(&snapshot);
        assert!(text.starts_with("Updated "));
        assert_eq!(color, Color::Green);

        snapshot.stale = true;
        let (text, color) = freshness(&snapshot);
        assert!(text.starts_with("STALE since "));
        assert_eq!(color, Color::Red);

        snapshot.last_poll_ok = None;
        assert_eq!(freshness(&snapshot).0, "STALE");
    }

    #[test]
    fn renders_event_and_status() {
        let mut state = ViewState::default();
        state.snapshot = live_snapshot();
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("GAVEL"));
        assert!(text.contains("Harbour League 2026"));
        assert!(text.contains(AuctionStatus::InProgress.label()));
        assert!(text.contains("Panel"));
    }
}
