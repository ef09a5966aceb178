// Auction records as served by the REST backend.
//
// Every optional field is an `Option` here so that shape checks happen once,
// when the JSON is deserialized, rather than at each place the data is shown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an auction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl AuctionStatus {
    pub fn label(self) -> &'static str {
        match self {
            AuctionStatus::NotStarted => "NOT STARTED",
            AuctionStatus::InProgress => "LIVE",
            AuctionStatus::Paused => "PAUSED",
            AuctionStatus::Completed => "COMPLETED",
        }
    }
}

/// Where a player stands in the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Available,
    Sold,
    Unsold,
    Current,
}

impl PlayerStatus {
    pub fn label(self) -> &'static str {
        match self {
            PlayerStatus::Available => "Available",
            PlayerStatus::Sold => "Sold",
            PlayerStatus::Unsold => "Unsold",
            PlayerStatus::Current => "On the block",
        }
    }
}

/// One entry of the server's bid history for the current player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    pub team_name: String,
    pub amount: u64,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Server-authoritative snapshot of the current bidding round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionState {
    #[serde(default)]
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub status: AuctionStatus,
    #[serde(default)]
    pub current_player_id: Option<String>,
    #[serde(default)]
    pub current_bid: Option<u64>,
    #[serde(default)]
    pub current_team_id: Option<String>,
    #[serde(default)]
    pub current_team_name: Option<String>,
    #[serde(default)]
    pub timer_started_at: Option<DateTime<Utc>>,
    #[serde(default = "default_timer_duration")]
    pub timer_duration: u32,
    /// Ordered oldest first; the server only ever appends.
    #[serde(default)]
    pub bid_history: Vec<BidRecord>,
}

fn default_timer_duration() -> u32 {
    60
}

impl AuctionState {
    /// The state the server reports before an auction has ever started.
    pub fn not_started(event_id: &str) -> Self {
        AuctionState {
            id: format!("auction_{event_id}"),
            event_id: event_id.to_string(),
            status: AuctionStatus::NotStarted,
            current_player_id: None,
            current_bid: None,
            current_team_id: None,
            current_team_name: None,
            timer_started_at: None,
            timer_duration: default_timer_duration(),
            bid_history: Vec::new(),
        }
    }

    /// The leading team and bid, when somebody has bid on the current player.
    pub fn leading_bid(&self) -> Option<(&str, u64)> {
        let team = self.current_team_name.as_deref()?;
        self.current_team_id.as_ref()?;
        Some((team, self.current_bid?))
    }
}

/// Per-sport career numbers. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub matches: Option<u32>,
    #[serde(default)]
    pub runs: Option<u32>,
    #[serde(default)]
    pub wickets: Option<u32>,
    #[serde(default)]
    pub goals: Option<u32>,
    #[serde(default)]
    pub assists: Option<u32>,
}

impl PlayerStats {
    /// Label/value pairs for the fields that are present, in display order.
    pub fn present(&self) -> Vec<(&'static str, u32)> {
        [
            ("Matches", self.matches),
            ("Runs", self.runs),
            ("Wickets", self.wickets),
            ("Goals", self.goals),
            ("Assists", self.assists),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub base_price: u64,
    #[serde(default)]
    pub status: PlayerStatus,
    #[serde(default)]
    pub current_price: Option<u64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub previous_team: Option<String>,
    #[serde(default)]
    pub sold_to_team_id: Option<String>,
    #[serde(default)]
    pub sold_price: Option<u64>,
    #[serde(default)]
    pub stats: Option<PlayerStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub budget: u64,
    #[serde(default)]
    pub spent: u64,
    pub remaining: u64,
    #[serde(default)]
    pub max_squad_size: u32,
    #[serde(default)]
    pub players_count: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub min_players: u32,
    #[serde(default)]
    pub max_players: u32,
    #[serde(default)]
    pub base_price_min: u64,
    #[serde(default)]
    pub base_price_max: u64,
    #[serde(default)]
    pub color: Option<String>,
}

/// Server-computed bidding headroom for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSafeBid {
    pub team_id: String,
    pub team_name: String,
    pub remaining: u64,
    pub safe_bid: u64,
    #[serde(default)]
    pub obligation: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRules {
    #[serde(default = "default_timer_duration")]
    pub timer_duration: u32,
    #[serde(default)]
    pub min_bid_increment: u64,
}

impl Default for EventRules {
    fn default() -> Self {
        EventRules {
            timer_duration: default_timer_duration(),
            min_bid_increment: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: AuctionStatus,
    #[serde(default)]
    pub rules: EventRules,
}

/// Look up a player by id. Linear scan; player lists are a few hundred long.
pub fn find_player<'a>(players: &'a [Player], id: &str) -> Option<&'a Player> {
    players.iter().find(|p| p.id == id)
}

pub fn find_team<'a>(teams: &'a [Team], id: &str) -> Option<&'a Team> {
    teams.iter().find(|t| t.id == id)
}

pub fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_state_from_server_json() {
        let json = r#"{
            "id": "auction_e1",
            "event_id": "e1",
            "current_player_id": "p7",
            "current_bid": 150000,
            "current_team_id": "t2",
            "current_team_name": "Strikers",
            "timer_started_at": "2025-02-01T10:15:00+00:00",
            "timer_duration": 60,
            "status": "in_progress",
            "bid_history": [
                {"team_name": "Titans", "amount": 100000},
                {"team_name": "Strikers", "amount": 150000, "team_id": "t2"}
            ]
        }"#;
        let state: AuctionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.status, AuctionStatus::InProgress);
        assert_eq!(state.current_player_id.as_deref(), Some("p7"));
        assert_eq!(state.bid_history.len(), 2);
        assert_eq!(state.bid_history[1].amount, 150000);
        assert!(state.timer_started_at.is_some());
        assert_eq!(state.leading_bid(), Some(("Strikers", 150000)));
    }

    #[test]
    fn sparse_auction_state_uses_defaults() {
        let state: AuctionState = serde_json::from_str(r#"{"event_id": "e1"}"#).unwrap();
        assert_eq!(state.status, AuctionStatus::NotStarted);
        assert_eq!(state.timer_duration, 60);
        assert!(state.bid_history.is_empty());
        assert!(state.leading_bid().is_none());
    }

    #[test]
    fn leading_bid_requires_team_id() {
        let mut state = AuctionState::not_started("e1");
        state.current_team_name = Some("Titans".into());
        state.current_bid = Some(5000);
        assert!(state.leading_bid().is_none());
        state.current_team_id = Some("t1".into());
        assert_eq!(state.leading_bid(), Some(("Titans", 5000)));
    }

    #[test]
    fn player_with_partial_stats() {
        let json = r#"{
            "id": "p1", "name": "A. Kumar", "category_id": "c1",
            "base_price": 20000, "status": "available",
            "stats": {"matches": 40, "runs": null, "wickets": 61}
        }"#;
        let player: Player = serde_json::from_str(json).unwrap();
        let stats = player.stats.unwrap();
        assert_eq!(stats.present(), vec![("Matches", 40), ("Wickets", 61)]);
    }

    #[test]
    fn unknown_status_is_rejected_at_the_boundary() {
        let json = r#"{"id": "p1", "name": "X", "category_id": "c", "base_price": 1, "status": "retired"}"#;
        assert!(serde_json::from_str::<Player>(json).is_err());
    }

    #[test]
    fn lookups_by_id() {
        let teams = vec![Team {
            id: "t1".into(),
            name: "Titans".into(),
            budget: 100,
            spent: 0,
            remaining: 100,
            max_squad_size: 15,
            players_count: 0,
            color: None,
            logo_url: None,
        }];
        assert_eq!(find_team(&teams, "t1").map(|t| t.name.as_str()), Some("Titans"));
        assert!(find_team(&teams, "t9").is_none());
    }
}
