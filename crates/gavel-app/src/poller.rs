// Server state poller.
//
// One fetch at a time: auction state, players, teams and the safe-bid summary
// are requested together and come back to the control loop as a single
// `PollBatch`. Every fetch is stamped with an epoch; invalidating the poller
// bumps the epoch and aborts whatever is in flight, so a batch that started
// before a sale was recorded can never be applied after it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use gavel_api::{ApiError, AuctionApi};
use gavel_core::model::{AuctionState, Player, Team, TeamSafeBid};

use crate::app::AppEvent;
use crate::lock::TransitionLock;
use crate::scope::ScopedTask;

/// Results of one poll. Each part may fail independently.
#[derive(Debug)]
pub struct PollBatch {
    pub epoch: u64,
    pub state: Result<AuctionState, ApiError>,
    pub players: Result<Vec<Player>, ApiError>,
    pub teams: Result<Vec<Team>, ApiError>,
    pub safe_bids: Result<Vec<TeamSafeBid>, ApiError>,
}

impl PollBatch {
    /// A poll counts as successful when the auction state came back.
    pub fn is_ok(&self) -> bool {
        self.state.is_ok()
    }
}

/// Fetch everything the control view shows, concurrently.
pub async fn fetch_batch(
    api: &dyn AuctionApi,
    event_id: &str,
    category_id: Option<&str>,
    epoch: u64,
) -> PollBatch {
    let (state, players, teams, safe_bids) = tokio::join!(
        api.auction_state(event_id),
        api.players(event_id),
        api.teams(event_id),
        api.safe_bid_summary(event_id, category_id),
    );
    PollBatch {
        epoch,
        state,
        players,
        teams,
        safe_bids,
    }
}

/// Outcome of asking the poller to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStart {
    Started { epoch: u64 },
    /// The transition lock is engaged.
    Suppressed,
    /// A previous fetch has not finished yet.
    InFlight,
}

#[derive(Debug, Default)]
pub struct Poller {
    epoch: u64,
    in_flight: Option<ScopedTask>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start a fetch unless the lock is engaged or one is already running.
    pub fn begin(
        &mut self,
        lock: &TransitionLock,
        api: Arc<dyn AuctionApi>,
        event_id: &str,
        category_id: Option<String>,
        tx: mpsc::Sender<AppEvent>,
    ) -> PollStart {
        if lock.is_engaged() {
            debug!("poll suppressed while a sale is on screen");
            return PollStart::Suppressed;
        }
        if self.is_fetching() {
            debug!(epoch = self.epoch, "poll skipped, previous fetch still running");
            return PollStart::InFlight;
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let event_id = event_id.to_string();
        self.in_flight = Some(ScopedTask::spawn("poll", async move {
            let batch = fetch_batch(api.as_ref(), &event_id, category_id.as_deref(), epoch).await;
            let _ = tx.send(AppEvent::Polled(Box::new(batch))).await;
        }));
        PollStart::Started { epoch }
    }

    /// Discard whatever is in flight; its results will be rejected by
    /// [`Poller::accept`] even if they were already sent.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        if let Some(mut task) = self.in_flight.take() {
            task.cancel();
        }
    }

    /// Whether a batch stamped `epoch` may be applied now.
    pub fn accept(&mut self, epoch: u64, lock: &TransitionLock) -> bool {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "discarding stale poll results");
            return false;
        }
        self.in_flight = None;
        if lock.is_engaged() {
            debug!(epoch, "discarding poll results while a sale is on screen");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_api::test_support::{ApiCall, MockAuctionApi};
    use gavel_core::model::PlayerStatus;

    fn frozen() -> Player {
        Player {
            id: "p1".into(),
            name: "Frozen".into(),
            category_id: "c1".into(),
            base_price: 100,
            status: PlayerStatus::Current,
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

    #[tokio::test]
    async fn fetch_batch_reads_all_four_endpoints() {
        let api = MockAuctionApi::new();
        let batch = fetch_batch(&api, "e1", Some("c1"), 7).await;
        assert_eq!(batch.epoch, 7);
        assert!(batch.is_ok());
        assert_eq!(api.state_reads(), 1);
        assert_eq!(api.count(|c| *c == ApiCall::Players), 1);
        assert_eq!(api.count(|c| *c == ApiCall::Teams), 1);
        assert_eq!(
            api.count(|c| *c
                == ApiCall::SafeBidSummary {
                    category_id: Some("c1".into())
                }),
            1
        );
    }

    #[tokio::test]
    async fn fetch_batch_reports_failures_per_part() {
        let api = MockAuctionApi::new();
        api.set_fail_reads(true);
        let batch = fetch_batch(&api, "e1", None, 1).await;
        assert!(!batch.is_ok());
        assert!(batch.players.is_err());
    }

    #[tokio::test]
    async fn begin_is_suppressed_by_the_lock() {
        let api = Arc::new(MockAuctionApi::new());
        let (tx, _rx) = mpsc::channel(4);
        let mut lock = TransitionLock::new();
        lock.engage(frozen(), "T", 1).unwrap();
        let mut poller = Poller::new();
        let started = poller.begin(&lock, api.clone(), "e1", None, tx);
        assert_eq!(started, PollStart::Suppressed);
        tokio::task::yield_now().await;
        assert_eq!(api.state_reads(), 0);
    }

    #[tokio::test]
    async fn only_one_fetch_at_a_time() {
        let api = Arc::new(MockAuctionApi::new());
        api.hold_state_reads();
        let (tx, _rx) = mpsc::channel(4);
        let lock = TransitionLock::new();
        let mut poller = Poller::new();
        assert_eq!(
            poller.begin(&lock, api.clone(), "e1", None, tx.clone()),
            PollStart::Started { epoch: 1 }
        );
        assert_eq!(
            poller.begin(&lock, api.clone(), "e1", None, tx),
            PollStart::InFlight
        );
    }

    #[tokio::test]
    async fn completed_fetch_is_accepted() {
        let api = Arc::new(MockAuctionApi::new());
        let (tx, mut rx) = mpsc::channel(4);
        let lock = TransitionLock::new();
        let mut poller = Poller::new();
        poller.begin(&lock, api, "e1", None, tx);
        let Some(AppEvent::Polled(batch)) = rx.recv().await else {
            panic!("expected poll results");
        };
        assert!(poller.accept(batch.epoch, &lock));
        assert!(!poller.is_fetching());
    }

    #[tokio::test]
    async fn invalidated_fetch_never_reports() {
        let api = Arc::new(MockAuctionApi::new());
        api.hold_state_reads();
        let (tx, mut rx) = mpsc::channel(4);
        let lock = TransitionLock::new();
        let mut poller = Poller::new();
        let PollStart::Started { epoch } = poller.begin(&lock, api.clone(), "e1", None, tx)
        else {
            panic!("expected the fetch to start");
        };
        tokio::task::yield_now().await;

        poller.invalidate();
        api.release_state_reads(1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(rx.try_recv().is_err());
        assert!(!poller.accept(epoch, &lock));
    }

    #[test]
    fn results_are_rejected_while_locked() {
        let mut lock = TransitionLock::new();
        let mut poller = Poller::new();
        lock.engage(frozen(), "T", 1).unwrap();
        assert!(!poller.accept(poller.epoch(), &lock));
    }
}
