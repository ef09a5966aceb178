// REST surface of the auction backend.
//
// `AuctionApi` is the seam between the control loop and the network: the
// binary uses the reqwest-backed `HttpAuctionApi`, tests use
// `test_support::MockAuctionApi` (behind the `test-support` feature).

pub mod client;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gavel_core::model::{AuctionEvent, AuctionState, Category, Player, Team, TeamSafeBid};

pub use client::HttpAuctionApi;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /bids/complete-transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub player_id: String,
    pub team_id: String,
    pub amount: u64,
    pub event_id: String,
}

/// Body of `POST /players/{id}/sell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectSaleRequest {
    pub team_id: String,
    pub price: u64,
    pub event_id: String,
}

/// The `{ "message": ... }` acknowledgement most mutations answer with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

/// What `/bids/finalize` reports it did with the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Sold at the bid the server was tracking.
    Sold,
    Unsold,
    Unknown,
}

impl Ack {
    /// Read a finalize acknowledgement. The server answers either
    /// "Bid finalized successfully" or "Player marked as unsold".
    pub fn finalize_outcome(&self) -> FinalizeOutcome {
        let message = self.message.to_ascii_lowercase();
        if message.contains("unsold") {
            FinalizeOutcome::Unsold
        } else if message.contains("finalized") {
            FinalizeOutcome::Sold
        } else {
            FinalizeOutcome::Unknown
        }
    }
}

// ---------------------------------------------------------------------------
// AuctionApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuctionApi: Send + Sync {
    async fn auction_state(&self, event_id: &str) -> Result<AuctionState, ApiError>;

    async fn event(&self, event_id: &str) -> Result<AuctionEvent, ApiError>;

    async fn players(&self, event_id: &str) -> Result<Vec<Player>, ApiError>;

    async fn teams(&self, event_id: &str) -> Result<Vec<Team>, ApiError>;

    async fn categories(&self, event_id: &str) -> Result<Vec<Category>, ApiError>;

    /// Per-team safe bids, optionally for one player category.
    async fn safe_bid_summary(
        &self,
        event_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<TeamSafeBid>, ApiError>;

    async fn start_auction(&self, event_id: &str) -> Result<Ack, ApiError>;

    async fn pause_auction(&self, event_id: &str) -> Result<Ack, ApiError>;

    async fn next_player(&self, event_id: &str, player_id: &str) -> Result<Ack, ApiError>;

    async fn complete_transaction(&self, sale: &SaleRequest) -> Result<Ack, ApiError>;

    /// Close the round using the server-tracked bid, or mark the player
    /// unsold when nobody bid.
    async fn finalize(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError>;

    async fn sell_player(
        &self,
        player_id: &str,
        sale: &DirectSaleRequest,
    ) -> Result<Ack, ApiError>;

    async fn mark_unsold(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError>;

    async fn make_available(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError>;
}
