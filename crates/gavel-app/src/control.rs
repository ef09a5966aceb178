// Auction control view-model.
//
// Holds the last good copy of everything the poller fetched, the transition
// lock and the local countdown, and answers the questions the view and the
// command handlers ask: who is on the block, who may be put up next, and
// whether a sale the operator entered is acceptable.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use gavel_core::model::{
    find_category, find_player, find_team, AuctionEvent, AuctionState, Category, Player,
    PlayerStatus, Team, TeamSafeBid,
};
use gavel_core::protocol::{ControlSnapshot, ViewMode};
use gavel_core::stats::AuctionSummary;

use crate::countdown::Countdown;
use crate::lock::{LockError, TransitionLock};
use crate::poller::PollBatch;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Operator input the control view refuses before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("no player is on the block")]
    NoCurrentPlayer,

    #[error("select a team first")]
    NoTeamSelected,

    #[error("enter a sale price")]
    NoPrice,

    #[error("price {price} is below the base price of {base_price}")]
    BelowBasePrice { price: u64, base_price: u64 },

    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("no available players left")]
    EmptyPool,

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// A validated sale, ready to be engaged and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleIntent {
    pub player: Player,
    pub team: Team,
    pub price: u64,
}

// ---------------------------------------------------------------------------
// AuctionControl
// ---------------------------------------------------------------------------

pub struct AuctionControl {
    pub event_id: String,
    pub event: Option<AuctionEvent>,
    pub state: AuctionState,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub categories: Vec<Category>,
    pub safe_bids: Vec<TeamSafeBid>,
    pub lock: TransitionLock,
    pub countdown: Countdown,
    pub view_mode: ViewMode,
    pub last_poll_ok: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    stale_after: u32,
    rng: StdRng,
}

impl AuctionControl {
    pub fn new(event_id: &str, timer_secs: u32, stale_after: u32, view_mode: ViewMode) -> Self {
        Self::with_rng(
            event_id,
            timer_secs,
            stale_after,
            view_mode,
            StdRng::from_entropy(),
        )
    }

    /// Like [`AuctionControl::new`] with a caller-supplied generator, so
    /// random selection can be made deterministic.
    pub fn with_rng(
        event_id: &str,
        timer_secs: u32,
        stale_after: u32,
        view_mode: ViewMode,
        rng: StdRng,
    ) -> Self {
        AuctionControl {
            event_id: event_id.to_string(),
            event: None,
            state: AuctionState::not_started(event_id),
            players: Vec::new(),
            teams: Vec::new(),
            categories: Vec::new(),
            safe_bids: Vec::new(),
            lock: TransitionLock::new(),
            countdown: Countdown::new(timer_secs),
            view_mode,
            last_poll_ok: None,
            consecutive_failures: 0,
            stale_after,
            rng,
        }
    }

    // -- Lookups ------------------------------------------------------------

    /// The player to spotlight. While a sale is on screen this is the frozen
    /// player, whatever the polled state says.
    pub fn current_player(&self) -> Option<&Player> {
        if let Some(frozen) = self.lock.frozen_player() {
            return Some(frozen);
        }
        let id = self.state.current_player_id.as_deref()?;
        find_player(&self.players, id)
    }

    pub fn current_category(&self) -> Option<&Category> {
        let player = self.current_player()?;
        find_category(&self.categories, &player.category_id)
    }

    /// Players that may be put up next.
    pub fn available_pool(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.status == PlayerStatus::Available)
            .collect()
    }

    /// Uniform choice over the available pool.
    pub fn pick_random_available(&mut self) -> Result<Player, ControlError> {
        let pool: Vec<&Player> = self
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Available)
            .collect();
        pool.choose(&mut self.rng)
            .map(|p| (*p).clone())
            .ok_or(ControlError::EmptyPool)
    }

    pub fn player(&self, player_id: &str) -> Result<&Player, ControlError> {
        find_player(&self.players, player_id)
            .ok_or_else(|| ControlError::UnknownPlayer(player_id.to_string()))
    }

    // -- Sale validation ----------------------------------------------------

    /// Check a sale of `player` before anything is engaged or sent.
    pub fn validate_sale(
        &self,
        player: &Player,
        team_id: Option<&str>,
        price: Option<u64>,
    ) -> Result<SaleIntent, ControlError> {
        let team_id = team_id
            .filter(|id| !id.is_empty())
            .ok_or(ControlError::NoTeamSelected)?;
        let price = price.ok_or(ControlError::NoPrice)?;
        if price < player.base_price {
            return Err(ControlError::BelowBasePrice {
                price,
                base_price: player.base_price,
            });
        }
        let team = find_team(&self.teams, team_id)
            .ok_or_else(|| ControlError::UnknownTeam(team_id.to_string()))?;
        Ok(SaleIntent {
            player: player.clone(),
            team: team.clone(),
            price,
        })
    }

    /// Validate a sale of whoever is on the block.
    pub fn prepare_sale(
        &self,
        team_id: Option<&str>,
        price: Option<u64>,
    ) -> Result<SaleIntent, ControlError> {
        if self.lock.is_engaged() {
            return Err(LockError::AlreadyEngaged.into());
        }
        let player = self.current_player().ok_or(ControlError::NoCurrentPlayer)?;
        self.validate_sale(player, team_id, price)
    }

    /// The server's leading bid as a sale, for closing the round. `None` when
    /// nobody has bid.
    pub fn leading_sale(&self) -> Result<Option<SaleIntent>, ControlError> {
        if self.lock.is_engaged() {
            return Err(LockError::AlreadyEngaged.into());
        }
        let player = self.current_player().ok_or(ControlError::NoCurrentPlayer)?;
        let Some((team_name, price)) = self.state.leading_bid() else {
            return Ok(None);
        };
        let team_id = self.state.current_team_id.clone().unwrap_or_default();
        let team = match find_team(&self.teams, &team_id) {
            Some(team) => team.clone(),
            None => {
                // Stamp with what the server reported; the next poll brings
                // the team list up to date.
                warn!(
                    team_id = %team_id,
                    team = team_name,
                    "leading team is not in the cached team list"
                );
                Team {
                    id: team_id,
                    name: team_name.to_string(),
                    budget: 0,
                    spent: 0,
                    remaining: 0,
                    max_squad_size: 0,
                    players_count: 0,
                    color: None,
                    logo_url: None,
                }
            }
        };
        Ok(Some(SaleIntent {
            player: player.clone(),
            team,
            price,
        }))
    }

    /// Engage the transition lock for `intent` and stop the countdown.
    pub fn engage_sale(&mut self, intent: &SaleIntent) -> Result<u64, ControlError> {
        let generation = self
            .lock
            .engage(intent.player.clone(), intent.team.name.clone(), intent.price)?;
        self.countdown.pause();
        info!(
            player = %intent.player.name,
            team = %intent.team.name,
            price = intent.price,
            generation,
            "sale engaged"
        );
        Ok(generation)
    }

    // -- Poll results -------------------------------------------------------

    /// Fold an accepted batch into the caches. Parts that failed keep their
    /// previous value.
    pub fn apply_poll(&mut self, batch: PollBatch) {
        let PollBatch {
            epoch,
            state,
            players,
            teams,
            safe_bids,
        } = batch;

        match state {
            Ok(state) => {
                if state.current_player_id != self.state.current_player_id {
                    debug!(
                        from = ?self.state.current_player_id,
                        to = ?state.current_player_id,
                        "current player changed on server"
                    );
                }
                self.state = state;
                self.last_poll_ok = Some(Utc::now());
                if self.consecutive_failures > 0 {
                    info!(
                        failures = self.consecutive_failures,
                        "backend reachable again"
                    );
                }
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(epoch, failures = self.consecutive_failures, "poll failed: {}", e);
            }
        }
        match players {
            Ok(players) => self.players = players,
            Err(e) => debug!(epoch, "players fetch failed: {}", e),
        }
        match teams {
            Ok(teams) => self.teams = teams,
            Err(e) => debug!(epoch, "teams fetch failed: {}", e),
        }
        match safe_bids {
            Ok(safe_bids) => self.safe_bids = safe_bids,
            Err(e) => debug!(epoch, "safe bid fetch failed: {}", e),
        }
    }

    /// True once enough polls in a row have failed.
    pub fn is_stale(&self) -> bool {
        self.stale_after > 0 && self.consecutive_failures >= self.stale_after
    }

    // -- Snapshot -----------------------------------------------------------

    pub fn snapshot(&self) -> ControlSnapshot {
        let locked = self.lock.is_engaged();
        // The round's bid data belongs to the frozen player only until the
        // server moves on, so hide it while the stamp is up.
        let (current_bid, leading_team, bid_history) = if locked {
            (None, None, Vec::new())
        } else {
            (
                self.state.current_bid,
                self.state.current_team_name.clone(),
                self.state.bid_history.clone(),
            )
        };

        ControlSnapshot {
            event_name: self.event.as_ref().map(|e| e.name.clone()),
            status: self.state.status,
            current_player: self.current_player().cloned(),
            current_category: self.current_category().cloned(),
            current_bid,
            leading_team,
            bid_history,
            players: self.players.clone(),
            teams: self.teams.clone(),
            safe_bids: self.safe_bids.clone(),
            sold_stamp: self.lock.display().cloned(),
            summary: AuctionSummary::from_players(&self.players),
            last_poll_ok: self.last_poll_ok,
            stale: self.is_stale(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
