// Terminal view: layout, input handling, and widget rendering.
//
// The view owns a `ViewState` mirroring what the control loop last pushed.
// `UiUpdate`s are applied as they arrive; the frame is redrawn at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info};

use gavel_core::config::DisplayConfig;
use gavel_core::model::{Player, PlayerStatus};
use gavel_core::protocol::{
    format_price, ControlSnapshot, Notification, TimerView, UiUpdate, UserCommand, ViewMode,
};

use layout::build_layout;

/// Most toasts shown at once; older ones are dropped.
const MAX_TOASTS: usize = 4;

// ---------------------------------------------------------------------------
// View-local types
// ---------------------------------------------------------------------------

/// A notification with the moment it should disappear.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires_at: Instant,
}

/// Which players the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerFilter {
    #[default]
    All,
    Available,
    Sold,
    Unsold,
}

impl PlayerFilter {
    pub fn next(self) -> Self {
        match self {
            PlayerFilter::All => PlayerFilter::Available,
            PlayerFilter::Available => PlayerFilter::Sold,
            PlayerFilter::Sold => PlayerFilter::Unsold,
            PlayerFilter::Unsold => PlayerFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerFilter::All => "All",
            PlayerFilter::Available => "Available",
            PlayerFilter::Sold => "Sold",
            PlayerFilter::Unsold => "Unsold",
        }
    }

    pub fn matches(self, status: PlayerStatus) -> bool {
        match self {
            PlayerFilter::All => true,
            PlayerFilter::Available => status == PlayerStatus::Available,
            PlayerFilter::Sold => status == PlayerStatus::Sold,
            PlayerFilter::Unsold => status == PlayerStatus::Unsold,
        }
    }
}

/// Who the open sale form sells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleTarget {
    /// The player on the block, recorded with the SOLD stamp.
    Current,
    /// Any player, sold directly without the stamp.
    Direct { player_id: String },
}

/// The team-and-price form shown while recording a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleForm {
    pub target: SaleTarget,
    pub player_name: String,
    /// Index into the snapshot's team list.
    pub team: Option<usize>,
    /// Digits typed so far.
    pub price: String,
}

impl SaleForm {
    pub fn price_value(&self) -> Option<u64> {
        self.price.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

pub struct ViewState {
    pub snapshot: ControlSnapshot,
    pub timer: TimerView,
    /// Set when the countdown ran out; cleared once it runs again.
    pub timer_expired: bool,
    pub view_mode: ViewMode,
    pub toasts: Vec<Toast>,
    pub toast_ttl: Duration,
    pub currency: String,
    pub player_filter: PlayerFilter,
    /// Index into [`ViewState::visible_players`].
    pub selected: usize,
    pub sale_form: Option<SaleForm>,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn new(display: &DisplayConfig) -> Self {
        ViewState {
            snapshot: ControlSnapshot::default(),
            timer: TimerView {
                remaining: 0,
                duration: 0,
                active: false,
            },
            timer_expired: false,
            view_mode: display.mode,
            toasts: Vec::new(),
            toast_ttl: Duration::from_secs(display.toast_secs),
            currency: display.currency.clone(),
            player_filter: PlayerFilter::default(),
            selected: 0,
            sale_form: None,
            confirm_quit: false,
        }
    }

    pub fn price(&self, amount: u64) -> String {
        format_price(&self.currency, amount)
    }

    /// Players passing the current filter, in server order.
    pub fn visible_players(&self) -> Vec<&Player> {
        self.snapshot
            .players
            .iter()
            .filter(|p| self.player_filter.matches(p.status))
            .collect()
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.visible_players().get(self.selected).copied()
    }

    /// Keep the selection inside the visible list.
    pub fn clamp_selection(&mut self) {
        let len = self.visible_players().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn push_toast(&mut self, notification: Notification, now: Instant) {
        self.toasts.push(Toast {
            notification,
            expires_at: now + self.toast_ttl,
        });
        if self.toasts.len() > MAX_TOASTS {
            let excess = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..excess);
        }
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(&DisplayConfig::default())
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate, now: Instant) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.snapshot = *snapshot;
            state.clamp_selection();
        }
        UiUpdate::Timer(timer) => {
            if timer.active {
                state.timer_expired = false;
            }
            state.timer = timer;
        }
        UiUpdate::TimerExpired => state.timer_expired = true,
        UiUpdate::Notify(notification) => state.push_toast(notification, now),
        UiUpdate::ViewMode(mode) => state.view_mode = mode,
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let area = frame.area();
    let layout = build_layout(area, state.view_mode);

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::spotlight::render(frame, layout.spotlight, state);
    widgets::bid_history::render(frame, layout.bid_history, state);
    widgets::teams::render(frame, layout.teams, state);
    if let Some(players) = layout.players {
        widgets::players::render(frame, players, state);
    }
    widgets::summary::render(frame, layout.summary, state);
    if let Some(help_bar) = layout.help_bar {
        widgets::help_bar::render(frame, help_bar, state);
    }

    // Overlays, bottom to top.
    if let Some(stamp) = &state.snapshot.sold_stamp {
        widgets::sold_stamp::render(frame, area, stamp, state);
    }
    if let Some(form) = &state.sale_form {
        widgets::sale_form::render(frame, area, form, state);
    }
    widgets::toasts::render(frame, area, state);
    if state.confirm_quit {
        widgets::quit_confirm::render(frame, area);
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the terminal view until the operator quits or the control loop goes
/// away. Restores the terminal on exit and on panic.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    display: &DisplayConfig,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(display);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => apply_ui_update(&mut view_state, update, Instant::now()),
                    None => {
                        info!("control loop closed its channel");
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            debug!(?cmd, "operator command");
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        info!("terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                view_state.expire_toasts(Instant::now());
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_fixtures {
    use gavel_core::model::{
        AuctionStatus, BidRecord, Category, Player, PlayerStats, PlayerStatus, Team, TeamSafeBid,
    };
    use gavel_core::protocol::{ControlSnapshot, SaleDisplay};
    use gavel_core::stats::AuctionSummary;

    pub fn player(id: &str, name: &str, status: PlayerStatus) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            category_id: "bat".into(),
            base_price: 10_000,
            status,
            current_price: None,
            photo_url: None,
            age: Some(27),
            position: Some("Batter".into()),
            specialty: Some("Opener".into()),
            previous_team: Some("Harbour XI".into()),
            sold_to_team_id: None,
            sold_price: None,
            stats: Some(PlayerStats {
                matches: Some(40),
                runs: Some(1250),
                ..Default::default()
            }),
        }
    }

    pub fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            budget: 500_000,
            spent: 120_000,
            remaining: 380_000,
            max_squad_size: 15,
            players_count: 4,
            color: None,
            logo_url: None,
        }
    }

    /// A live round: Asha on the block with a bid from the Lions.
    pub fn live_snapshot() -> ControlSnapshot {
        let mut sold = player("p3", "Chen", PlayerStatus::Sold);
        sold.sold_to_team_id = Some("t1".into());
        sold.sold_price = Some(42_000);
        let players = vec![
            player("p1", "Asha", PlayerStatus::Current),
            player("p2", "Bilal", PlayerStatus::Available),
            sold,
            player("p4", "Dev", PlayerStatus::Unsold),
        ];
        ControlSnapshot {
            event_name: Some("Harbour League 2026".into()),
            status: AuctionStatus::InProgress,
            current_player: Some(players[0].clone()),
            current_category: Some(Category {
                id: "bat".into(),
                name: "Batters".into(),
                min_players: 2,
                max_players: 6,
                base_price_min: 5_000,
                base_price_max: 50_000,
                color: None,
            }),
            current_bid: Some(18_000),
            leading_team: Some("Lions".into()),
            bid_history: vec![
                BidRecord {
                    team_name: "Tigers".into(),
                    amount: 15_000,
                    team_id: Some("t1".into()),
                    timestamp: None,
                },
                BidRecord {
                    team_name: "Lions".into(),
                    amount: 18_000,
                    team_id: Some("t2".into()),
                    timestamp: None,
                },
            ],
            summary: AuctionSummary::from_players(&players),
            players,
            teams: vec![team("t1", "Tigers"), team("t2", "Lions")],
            safe_bids: vec![TeamSafeBid {
                team_id: "t2".into(),
                team_name: "Lions".into(),
                remaining: 380_000,
                safe_bid: 300_000,
                obligation: Some(80_000),
            }],
            sold_stamp: None,
            last_poll_ok: None,
            stale: false,
        }
    }

    pub fn stamp() -> SaleDisplay {
        SaleDisplay {
            player_name: "Asha".into(),
            team_name: "Lions".into(),
            price: 18_000,
        }
    }

    /// Flatten a test buffer into one string for substring checks.
    pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }
}
