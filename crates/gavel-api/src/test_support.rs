// In-memory stand-in for the auction backend.
//
// Applies the same state transitions the real server does for each mutation,
// records every call, and can be told to fail reads, fail mutations, hold
// state reads until released, or never answer mutations at all.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use gavel_core::model::{
    AuctionEvent, AuctionState, AuctionStatus, BidRecord, Category, EventRules, Player,
    PlayerStatus, Team, TeamSafeBid,
};

use crate::{Ack, ApiError, AuctionApi, DirectSaleRequest, SaleRequest};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    AuctionState,
    Event,
    Players,
    Teams,
    Categories,
    SafeBidSummary { category_id: Option<String> },
    StartAuction,
    PauseAuction,
    NextPlayer { player_id: String },
    CompleteTransaction(SaleRequest),
    Finalize { player_id: String },
    SellPlayer { player_id: String, sale: DirectSaleRequest },
    MarkUnsold { player_id: String },
    MakeAvailable { player_id: String },
}

impl ApiCall {
    /// Whether this call changes server state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiCall::AuctionState
                | ApiCall::Event
                | ApiCall::Players
                | ApiCall::Teams
                | ApiCall::Categories
                | ApiCall::SafeBidSummary { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<ApiCall>,
    auction: Option<AuctionState>,
    event: Option<AuctionEvent>,
    players: Vec<Player>,
    teams: Vec<Team>,
    categories: Vec<Category>,
    safe_bids: Vec<TeamSafeBid>,
    fail_reads: bool,
    fail_mutations: Option<String>,
    hang_mutations: bool,
    state_gate: Option<Arc<Semaphore>>,
}

#[derive(Debug, Default)]
pub struct MockAuctionApi {
    inner: Mutex<MockState>,
}

impl MockAuctionApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_players(self, players: Vec<Player>) -> Self {
        self.lock().players = players;
        self
    }

    pub fn with_teams(self, teams: Vec<Team>) -> Self {
        self.lock().teams = teams;
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.lock().categories = categories;
        self
    }

    pub fn with_state(self, state: AuctionState) -> Self {
        self.lock().auction = Some(state);
        self
    }

    pub fn with_event(self, event: AuctionEvent) -> Self {
        self.lock().event = Some(event);
        self
    }

    pub fn with_safe_bids(self, safe_bids: Vec<TeamSafeBid>) -> Self {
        self.lock().safe_bids = safe_bids;
        self
    }

    /// Make every read answer `503`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make every mutation answer `400` with `detail`.
    pub fn set_fail_mutations(&self, detail: Option<&str>) {
        self.lock().fail_mutations = detail.map(str::to_string);
    }

    /// Make every mutation wait forever.
    pub fn set_hang_mutations(&self, hang: bool) {
        self.lock().hang_mutations = hang;
    }

    /// Hold `auction_state` reads until [`release_state_reads`] is called.
    ///
    /// [`release_state_reads`]: MockAuctionApi::release_state_reads
    pub fn hold_state_reads(&self) {
        self.lock().state_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `count` held `auction_state` reads through.
    pub fn release_state_reads(&self, count: usize) {
        if let Some(gate) = &self.lock().state_gate {
            gate.add_permits(count);
        }
    }

    /// Replace the server-side auction state, e.g. to simulate another admin.
    pub fn set_state(&self, state: AuctionState) {
        self.lock().auction = Some(state);
    }

    /// Simulate a bid placed by a team admin.
    pub fn place_bid(&self, event_id: &str, team_id: &str, amount: u64) {
        let mut inner = self.lock();
        let team_name = inner
            .teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| team_id.to_string());
        let auction = inner
            .auction
            .get_or_insert_with(|| AuctionState::not_started(event_id));
        auction.current_bid = Some(amount);
        auction.current_team_id = Some(team_id.to_string());
        auction.current_team_name = Some(team_name.clone());
        auction.bid_history.push(BidRecord {
            team_name,
            amount,
            team_id: Some(team_id.to_string()),
            timestamp: None,
        });
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn state_reads(&self) -> usize {
        self.count(|c| *c == ApiCall::AuctionState)
    }

    pub fn mutations(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn player(&self, player_id: &str) -> Option<Player> {
        self.lock().players.iter().find(|p| p.id == player_id).cloned()
    }

    fn record_read(&self, call: ApiCall) -> Result<(), ApiError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.fail_reads {
            return Err(ApiError::Status {
                status: 503,
                detail: "Database not available".into(),
            });
        }
        Ok(())
    }

    /// Record a mutation; hang or fail as configured, otherwise apply `f`.
    async fn mutate(
        &self,
        call: ApiCall,
        f: impl FnOnce(&mut MockState) -> Result<String, String> + Send,
    ) -> Result<Ack, ApiError> {
        let hang = {
            let mut inner = self.lock();
            inner.calls.push(call);
            inner.hang_mutations
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut inner = self.lock();
        if let Some(detail) = inner.fail_mutations.clone() {
            return Err(ApiError::Status {
                status: 400,
                detail,
            });
        }
        match f(&mut *inner) {
            Ok(message) => Ok(Ack { message }),
            Err(detail) => Err(ApiError::Status {
                status: 400,
                detail,
            }),
        }
    }
}

fn auction_mut<'a>(state: &'a mut MockState, event_id: &str) -> &'a mut AuctionState {
    state
        .auction
        .get_or_insert_with(|| AuctionState::not_started(event_id))
}

fn player_mut<'a>(state: &'a mut MockState, player_id: &str) -> Result<&'a mut Player, String> {
    state
        .players
        .iter_mut()
        .find(|p| p.id == player_id)
        .ok_or_else(|| "Player not found".to_string())
}

fn clear_round(auction: &mut AuctionState) {
    auction.current_player_id = None;
    auction.current_bid = None;
    auction.current_team_id = None;
    auction.current_team_name = None;
    auction.bid_history.clear();
}

fn sell(state: &mut MockState, player_id: &str, team_id: &str, price: u64) -> Result<(), String> {
    let team = state
        .teams
        .iter_mut()
        .find(|t| t.id == team_id)
        .ok_or_else(|| "Team not found".to_string())?;
    if team.remaining < price {
        return Err("Insufficient budget".into());
    }
    team.spent += price;
    team.remaining = team.budget.saturating_sub(team.spent);
    team.players_count += 1;

    let player = player_mut(state, player_id)?;
    player.status = PlayerStatus::Sold;
    player.sold_to_team_id = Some(team_id.to_string());
    player.sold_price = Some(price);
    Ok(())
}

#[async_trait]
impl AuctionApi for MockAuctionApi {
    async fn auction_state(&self, event_id: &str) -> Result<AuctionState, ApiError> {
        let gate = self.lock().state_gate.clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.record_read(ApiCall::AuctionState)?;
        Ok(self
            .lock()
            .auction
            .clone()
            .unwrap_or_else(|| AuctionState::not_started(event_id)))
    }

    async fn event(&self, event_id: &str) -> Result<AuctionEvent, ApiError> {
        self.record_read(ApiCall::Event)?;
        Ok(self.lock().event.clone().unwrap_or_else(|| AuctionEvent {
            id: event_id.to_string(),
            name: "Test Event".into(),
            date: String::new(),
            status: AuctionStatus::NotStarted,
            rules: EventRules::default(),
        }))
    }

    async fn players(&self, _event_id: &str) -> Result<Vec<Player>, ApiError> {
        self.record_read(ApiCall::Players)?;
        Ok(self.lock().players.clone())
    }

    async fn teams(&self, _event_id: &str) -> Result<Vec<Team>, ApiError> {
        self.record_read(ApiCall::Teams)?;
        Ok(self.lock().teams.clone())
    }

    async fn categories(&self, _event_id: &str) -> Result<Vec<Category>, ApiError> {
        self.record_read(ApiCall::Categories)?;
        Ok(self.lock().categories.clone())
    }

    async fn safe_bid_summary(
        &self,
        _event_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<TeamSafeBid>, ApiError> {
        self.record_read(ApiCall::SafeBidSummary {
            category_id: category_id.map(str::to_string),
        })?;
        Ok(self.lock().safe_bids.clone())
    }

    async fn start_auction(&self, event_id: &str) -> Result<Ack, ApiError> {
        let event_id = event_id.to_string();
        self.mutate(ApiCall::StartAuction, move |s| {
            let auction = auction_mut(s, &event_id);
            clear_round(auction);
            auction.status = AuctionStatus::InProgress;
            Ok("Auction started successfully".into())
        })
        .await
    }

    async fn pause_auction(&self, event_id: &str) -> Result<Ack, ApiError> {
        let event_id = event_id.to_string();
        self.mutate(ApiCall::PauseAuction, move |s| {
            auction_mut(s, &event_id).status = AuctionStatus::Paused;
            Ok("Auction paused".into())
        })
        .await
    }

    async fn next_player(&self, event_id: &str, player_id: &str) -> Result<Ack, ApiError> {
        let event_id = event_id.to_string();
        let pid = player_id.to_string();
        self.mutate(
            ApiCall::NextPlayer {
                player_id: pid.clone(),
            },
            move |s| {
                let player = player_mut(s, &pid)?;
                player.status = PlayerStatus::Current;
                let base_price = player.base_price;
                let auction = auction_mut(s, &event_id);
                clear_round(auction);
                auction.current_player_id = Some(pid);
                auction.current_bid = Some(base_price);
                Ok("Next player set".into())
            },
        )
        .await
    }

    async fn complete_transaction(&self, sale: &SaleRequest) -> Result<Ack, ApiError> {
        let sale = sale.clone();
        self.mutate(ApiCall::CompleteTransaction(sale.clone()), move |s| {
            sell(s, &sale.player_id, &sale.team_id, sale.amount)?;
            clear_round(auction_mut(s, &sale.event_id));
            Ok("Transaction completed".into())
        })
        .await
    }

    async fn finalize(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError> {
        let event_id = event_id.to_string();
        let pid = player_id.to_string();
        self.mutate(
            ApiCall::Finalize {
                player_id: pid.clone(),
            },
            move |s| {
                let auction = auction_mut(s, &event_id).clone();
                let outcome = match (auction.current_team_id, auction.current_bid) {
                    (Some(team_id), Some(bid)) => {
                        sell(s, &pid, &team_id, bid)?;
                        "Bid finalized successfully"
                    }
                    _ => {
                        player_mut(s, &pid)?.status = PlayerStatus::Unsold;
                        "Player marked as unsold"
                    }
                };
                clear_round(auction_mut(s, &event_id));
                Ok(outcome.to_string())
            },
        )
        .await
    }

    async fn sell_player(
        &self,
        player_id: &str,
        sale: &DirectSaleRequest,
    ) -> Result<Ack, ApiError> {
        let pid = player_id.to_string();
        let sale = sale.clone();
        self.mutate(
            ApiCall::SellPlayer {
                player_id: pid.clone(),
                sale: sale.clone(),
            },
            move |s| {
                sell(s, &pid, &sale.team_id, sale.price)?;
                Ok("Player sold".into())
            },
        )
        .await
    }

    async fn mark_unsold(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError> {
        let event_id = event_id.to_string();
        let pid = player_id.to_string();
        self.mutate(
            ApiCall::MarkUnsold {
                player_id: pid.clone(),
            },
            move |s| {
                player_mut(s, &pid)?.status = PlayerStatus::Unsold;
                let auction = auction_mut(s, &event_id);
                if auction.current_player_id.as_deref() == Some(pid.as_str()) {
                    clear_round(auction);
                }
                Ok("Player marked as unsold".into())
            },
        )
        .await
    }

    async fn make_available(&self, player_id: &str, _event_id: &str) -> Result<Ack, ApiError> {
        let pid = player_id.to_string();
        self.mutate(
            ApiCall::MakeAvailable {
                player_id: pid.clone(),
            },
            move |s| {
                let player = player_mut(s, &pid)?;
                player.status = PlayerStatus::Available;
                player.sold_to_team_id = None;
                player.sold_price = None;
                Ok("Player is available again".into())
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, base_price: u64) -> Player {
        Player {
            id: id.into(),
            name: id.to_uppercase(),
            category_id: "c".into(),
            base_price,
            status: PlayerStatus::Available,
            current_price: None,
            photo_url: None,
            age: None,
            position: None,
            specialty: None,
            previous_team: None,
            sold_to_team_id: None,
            sold_price: None,
            stats: None,
        }
    }

    fn team(id: &str, budget: u64) -> Team {
        Team {
            id: id.into(),
            name: format!("Team {id}"),
            budget,
            spent: 0,
            remaining: budget,
            max_squad_size: 15,
            players_count: 0,
            color: None,
            logo_url: None,
        }
    }

    #[tokio::test]
    async fn finalize_with_leading_bid_sells() {
        let api = MockAuctionApi::new()
            .with_players(vec![player("p1", 1000)])
            .with_teams(vec![team("t1", 10_000)]);
        api.next_player("e", "p1").await.unwrap();
        api.place_bid("e", "t1", 2500);

        let ack = api.finalize("p1", "e").await.unwrap();
        assert_eq!(ack.message, "Bid finalized successfully");
        let sold = api.player("p1").unwrap();
        assert_eq!(sold.status, PlayerStatus::Sold);
        assert_eq!(sold.sold_price, Some(2500));
        let state = api.auction_state("e").await.unwrap();
        assert!(state.current_player_id.is_none());
    }

    #[tokio::test]
    async fn finalize_without_bid_marks_unsold() {
        let api = MockAuctionApi::new().with_players(vec![player("p1", 1000)]);
        api.next_player("e", "p1").await.unwrap();
        let ack = api.finalize("p1", "e").await.unwrap();
        assert_eq!(ack.message, "Player marked as unsold");
        assert_eq!(api.player("p1").unwrap().status, PlayerStatus::Unsold);
    }

    #[tokio::test]
    async fn failing_mutations_still_record_the_call() {
        let api = MockAuctionApi::new();
        api.set_fail_mutations(Some("nope"));
        let err = api.start_auction("e").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
        assert_eq!(api.mutations(), vec![ApiCall::StartAuction]);
    }

    #[tokio::test]
    async fn sale_over_budget_is_rejected() {
        let api = MockAuctionApi::new()
            .with_players(vec![player("p1", 1000)])
            .with_teams(vec![team("t1", 500)]);
        let err = api
            .sell_player(
                "p1",
                &DirectSaleRequest {
                    team_id: "t1".into(),
                    price: 1000,
                    event_id: "e".into(),
                },
            )
            .await
            .unwrap_err();
        match err {
            ApiError::Status { detail, .. } => assert_eq!(detail, "Insufficient budget"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
