// Messages exchanged between the control loop and the terminal view.
//
// The control loop owns all auction state and pushes `UiUpdate`s; the view
// renders them and sends `UserCommand`s back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AuctionStatus, BidRecord, Category, Player, Team, TeamSafeBid};
use crate::stats::AuctionSummary;

/// Which layout the view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Compact admin panel with every control visible.
    #[default]
    Panel,
    /// Fullscreen layout meant for a projector facing the room.
    Projector,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Panel => ViewMode::Projector,
            ViewMode::Projector => ViewMode::Panel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient, non-blocking message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// `currency` followed by `amount` with comma thousands separators.
pub fn format_price(currency: &str, amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{currency}{grouped}")
}

/// What the SOLD stamp shows while a sale is being animated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDisplay {
    pub player_name: String,
    pub team_name: String,
    pub price: u64,
}

/// Countdown state as the view should draw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerView {
    pub remaining: u32,
    pub duration: u32,
    pub active: bool,
}

/// Everything the view needs to draw one frame of auction data.
#[derive(Debug, Clone, Default)]
pub struct ControlSnapshot {
    pub event_name: Option<String>,
    pub status: AuctionStatus,
    /// Resolved with the transition lock taking precedence over polled data.
    pub current_player: Option<Player>,
    pub current_category: Option<Category>,
    pub current_bid: Option<u64>,
    pub leading_team: Option<String>,
    pub bid_history: Vec<BidRecord>,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub safe_bids: Vec<TeamSafeBid>,
    pub sold_stamp: Option<SaleDisplay>,
    pub summary: AuctionSummary,
    pub last_poll_ok: Option<DateTime<Utc>>,
    pub stale: bool,
}

/// Updates pushed from the control loop to the view.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Snapshot(Box<ControlSnapshot>),
    Timer(TimerView),
    /// Sent once when the countdown reaches zero.
    TimerExpired,
    Notify(Notification),
    ViewMode(ViewMode),
}

/// Operator actions sent from the view to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    StartAuction,
    PauseAuction,
    NextPlayer { player_id: String },
    RandomNextPlayer,
    /// Sell the current player; `None` means nothing was chosen in the form.
    RecordSale {
        team_id: Option<String>,
        price: Option<u64>,
    },
    /// Close the round at whatever bid the server is tracking.
    FinalizeCurrent,
    DirectSale {
        player_id: String,
        team_id: Option<String>,
        price: Option<u64>,
    },
    MarkUnsold { player_id: String },
    MakeAvailable { player_id: String },
    StartTimer,
    PauseTimer,
    ResumeTimer,
    ResetTimer,
    ToggleViewMode,
    RefreshNow,
    ExportResults { path: String },
    Quit,
}
