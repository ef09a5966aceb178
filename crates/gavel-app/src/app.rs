// Control loop and command orchestration.
//
// A single task owns all auction state. It listens to operator commands from
// the terminal view, results coming back from spawned network tasks, the poll
// interval and the one-second countdown interval, and pushes `UiUpdate`s to
// the view after every change.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use gavel_api::{Ack, ApiError, AuctionApi, DirectSaleRequest, FinalizeOutcome, SaleRequest};
use gavel_core::config::{AuctionConfig, Config};
use gavel_core::export::export_results;
use gavel_core::model::{AuctionEvent, Category, Player};
use gavel_core::protocol::{format_price, Notification, UiUpdate, UserCommand};

use crate::control::{AuctionControl, ControlError, SaleIntent};
use crate::countdown::Tick;
use crate::poller::{PollBatch, Poller};
use crate::scope::{ScopedTask, TaskScope};

/// Period of the countdown interval.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Internal events
// ---------------------------------------------------------------------------

/// Results sent back to the loop by the tasks it spawned.
#[derive(Debug)]
pub enum AppEvent {
    Polled(Box<PollBatch>),
    EventLoaded(Result<AuctionEvent, ApiError>),
    CategoriesLoaded(Result<Vec<Category>, ApiError>),
    Mutation {
        action: Action,
        result: Result<Ack, ApiError>,
    },
    /// The SOLD display for engagement `generation` has run its course.
    LockExpired { generation: u64 },
}

/// A server mutation, as the operator would describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartAuction,
    PauseAuction,
    NextPlayer { player_name: String },
    /// A sale shown with the SOLD stamp.
    Sale {
        player_name: String,
        team_name: String,
        price: u64,
        route: SaleRoute,
    },
    DirectSale {
        player_name: String,
        team_name: String,
        price: u64,
    },
    /// Closing a round the cached state showed no bid on. The server
    /// decides the outcome from the bid it is tracking.
    Finalize { player_name: String },
    MarkUnsold { player_name: String },
    MakeAvailable { player_name: String },
}

impl Action {
    fn describe(&self) -> String {
        match self {
            Action::StartAuction => "start the auction".to_string(),
            Action::PauseAuction => "pause the auction".to_string(),
            Action::NextPlayer { player_name } => format!("put up {player_name}"),
            Action::Sale {
                player_name,
                team_name,
                ..
            }
            | Action::DirectSale {
                player_name,
                team_name,
                ..
            } => format!("sell {player_name} to {team_name}"),
            Action::Finalize { player_name } => format!("close bidding on {player_name}"),
            Action::MarkUnsold { player_name } => format!("mark {player_name} unsold"),
            Action::MakeAvailable { player_name } => format!("make {player_name} available"),
        }
    }

    /// Toast for a mutation the server accepted. Finalize outcomes come from
    /// the server's answer, never from the cached round.
    pub fn success_message(&self, currency: &str, ack: &Ack) -> String {
        match self {
            Action::StartAuction => "Auction started".to_string(),
            Action::PauseAuction => "Auction paused".to_string(),
            Action::NextPlayer { player_name } => format!("{player_name} is on the block"),
            Action::Sale {
                player_name,
                route: SaleRoute::Finalize,
                ..
            }
            | Action::Finalize { player_name } => finalize_message(player_name, ack),
            Action::Sale {
                player_name,
                team_name,
                price,
                ..
            }
            | Action::DirectSale {
                player_name,
                team_name,
                price,
            } => format!(
                "{player_name} sold to {team_name} for {}",
                format_price(currency, *price)
            ),
            Action::MarkUnsold { player_name } => format!("{player_name} marked unsold"),
            Action::MakeAvailable { player_name } => format!("{player_name} is available again"),
        }
    }

    pub fn failure_message(&self, err: &ApiError) -> String {
        let reason = match err {
            ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        };
        format!("Could not {}: {}", self.describe(), reason)
    }
}

/// What the loop should do with its own intervals after handling something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The countdown (re)started; the next tick must be a full second away.
    RestartCountdown,
}

fn finalize_message(player_name: &str, ack: &Ack) -> String {
    match ack.finalize_outcome() {
        FinalizeOutcome::Sold => format!("{player_name} sold at the closing bid"),
        FinalizeOutcome::Unsold => format!("{player_name} went unsold"),
        FinalizeOutcome::Unknown => format!("Bidding closed on {player_name}"),
    }
}

/// Which endpoint records a locked sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleRoute {
    /// `/bids/complete-transaction` with the team and price on the stamp.
    Transaction,
    /// `/bids/finalize`, which sells at whatever bid the server holds.
    Finalize,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub control: AuctionControl,
    api: Arc<dyn AuctionApi>,
    config: AuctionConfig,
    currency: String,
    poller: Poller,
    /// Mutations and one-off loads.
    tasks: TaskScope,
    lock_release: Option<ScopedTask>,
    /// The stamp may not match what the server recorded; fetch as soon as
    /// it comes down.
    reconcile_on_release: bool,
    event_tx: mpsc::Sender<AppEvent>,
}

impl AppState {
    pub fn new(api: Arc<dyn AuctionApi>, config: &Config, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let auction = &config.auction;
        let control = AuctionControl::new(
            &auction.event_id,
            auction.timer_duration_secs,
            auction.stale_after_failures,
            config.display.mode,
        );
        Self::with_control(api, config, control, event_tx)
    }

    /// Build around an existing view-model, e.g. one with a seeded generator.
    pub fn with_control(
        api: Arc<dyn AuctionApi>,
        config: &Config,
        control: AuctionControl,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        AppState {
            control,
            api,
            config: config.auction.clone(),
            currency: config.display.currency.clone(),
            poller: Poller::new(),
            tasks: TaskScope::new(),
            lock_release: None,
            reconcile_on_release: false,
            event_tx,
        }
    }

    // -- Outbound -----------------------------------------------------------

    async fn push_snapshot(&self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let snapshot = self.control.snapshot();
        let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
    }

    async fn push_timer(&self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let _ = ui_tx.send(UiUpdate::Timer(self.control.countdown.view())).await;
    }

    async fn notify(&self, ui_tx: &mpsc::Sender<UiUpdate>, notification: Notification) {
        let _ = ui_tx.send(UiUpdate::Notify(notification)).await;
    }

    // -- Background work ----------------------------------------------------

    /// Fetch event details and categories once.
    pub fn load_event_details(&mut self) {
        let event_id = self.control.event_id.clone();

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let id = event_id.clone();
        self.tasks.spawn("load-event", async move {
            let result = api.event(&id).await;
            let _ = tx.send(AppEvent::EventLoaded(result)).await;
        });

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        self.tasks.spawn("load-categories", async move {
            let result = api.categories(&event_id).await;
            let _ = tx.send(AppEvent::CategoriesLoaded(result)).await;
        });
    }

    /// Regular poll: skipped while locked or while a fetch is running.
    pub fn poll(&mut self) {
        let category = self
            .control
            .current_player()
            .map(|p| p.category_id.clone());
        self.poller.begin(
            &self.control.lock,
            self.api.clone(),
            &self.control.event_id,
            category,
            self.event_tx.clone(),
        );
    }

    /// Poll now, superseding any fetch that started before the caller's
    /// change reached the server.
    pub fn refresh(&mut self) {
        self.poller.invalidate();
        self.poll();
    }

    fn spawn_mutation<F, Fut>(&mut self, action: Action, call: F)
    where
        F: FnOnce(Arc<dyn AuctionApi>, String) -> Fut,
        Fut: Future<Output = Result<Ack, ApiError>> + Send + 'static,
    {
        info!(?action, "sending mutation");
        let future = call(self.api.clone(), self.control.event_id.clone());
        let tx = self.event_tx.clone();
        self.tasks.spawn("mutation", async move {
            let result = future.await;
            let _ = tx.send(AppEvent::Mutation { action, result }).await;
        });
    }

    fn schedule_release(&mut self, generation: u64) {
        let delay = self.config.sold_display();
        let tx = self.event_tx.clone();
        if let Some(mut previous) = self.lock_release.take() {
            previous.cancel();
        }
        self.lock_release = Some(ScopedTask::spawn("lock-release", async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::LockExpired { generation }).await;
        }));
    }

    /// Cancel every timer and request this state started.
    pub fn shutdown(&mut self) {
        self.poller.invalidate();
        if let Some(mut release) = self.lock_release.take() {
            release.cancel();
        }
        self.tasks.cancel_all();
    }

    // -- Commands -----------------------------------------------------------

    /// Handle an operator command. Refusals become error notifications.
    pub async fn handle_command(
        &mut self,
        cmd: UserCommand,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) -> Flow {
        match self.dispatch(cmd, ui_tx).await {
            Ok(flow) => flow,
            Err(e) => {
                info!("command refused: {}", e);
                self.notify(ui_tx, Notification::error(capitalize(&e.to_string())))
                    .await;
                Flow::Continue
            }
        }
    }

    async fn dispatch(
        &mut self,
        cmd: UserCommand,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) -> Result<Flow, ControlError> {
        match cmd {
            UserCommand::StartAuction => {
                self.spawn_mutation(Action::StartAuction, |api, event_id| async move {
                    api.start_auction(&event_id).await
                });
            }
            UserCommand::PauseAuction => {
                self.spawn_mutation(Action::PauseAuction, |api, event_id| async move {
                    api.pause_auction(&event_id).await
                });
            }
            UserCommand::NextPlayer { player_id } => {
                let player = self.control.player(&player_id)?.clone();
                self.put_up(player);
            }
            UserCommand::RandomNextPlayer => {
                let player = self.control.pick_random_available()?;
                info!(player = %player.name, "picked at random");
                self.put_up(player);
            }
            UserCommand::RecordSale { team_id, price } => {
                let intent = self.control.prepare_sale(team_id.as_deref(), price)?;
                self.record_sale(intent, SaleRoute::Transaction, ui_tx).await?;
            }
            UserCommand::FinalizeCurrent => match self.control.leading_sale()? {
                Some(intent) => self.record_sale(intent, SaleRoute::Finalize, ui_tx).await?,
                None => {
                    let player = self
                        .control
                        .current_player()
                        .cloned()
                        .ok_or(ControlError::NoCurrentPlayer)?;
                    let action = Action::Finalize {
                        player_name: player.name.clone(),
                    };
                    self.spawn_mutation(action, move |api, event_id| async move {
                        api.finalize(&player.id, &event_id).await
                    });
                }
            },
            UserCommand::DirectSale {
                player_id,
                team_id,
                price,
            } => {
                let player = self.control.player(&player_id)?;
                let intent = self.control.validate_sale(player, team_id.as_deref(), price)?;
                let action = Action::DirectSale {
                    player_name: intent.player.name.clone(),
                    team_name: intent.team.name.clone(),
                    price: intent.price,
                };
                self.spawn_mutation(action, move |api, event_id| async move {
                    let sale = DirectSaleRequest {
                        team_id: intent.team.id,
                        price: intent.price,
                        event_id,
                    };
                    api.sell_player(&intent.player.id, &sale).await
                });
            }
            UserCommand::MarkUnsold { player_id } => {
                let action = Action::MarkUnsold {
                    player_name: self.control.player(&player_id)?.name.clone(),
                };
                self.spawn_mutation(action, move |api, event_id| async move {
                    api.mark_unsold(&player_id, &event_id).await
                });
            }
            UserCommand::MakeAvailable { player_id } => {
                let action = Action::MakeAvailable {
                    player_name: self.control.player(&player_id)?.name.clone(),
                };
                self.spawn_mutation(action, move |api, event_id| async move {
                    api.make_available(&player_id, &event_id).await
                });
            }
            UserCommand::StartTimer => {
                self.control.countdown.start();
                self.push_timer(ui_tx).await;
                return Ok(Flow::RestartCountdown);
            }
            UserCommand::PauseTimer => {
                self.control.countdown.pause();
                self.push_timer(ui_tx).await;
            }
            UserCommand::ResumeTimer => {
                let running = self.control.countdown.resume();
                self.push_timer(ui_tx).await;
                if running {
                    return Ok(Flow::RestartCountdown);
                }
            }
            UserCommand::ResetTimer => {
                self.control.countdown.reset();
                self.push_timer(ui_tx).await;
            }
            UserCommand::ToggleViewMode => {
                self.control.view_mode = self.control.view_mode.toggled();
                debug!(mode = ?self.control.view_mode, "view mode toggled");
                let _ = ui_tx.send(UiUpdate::ViewMode(self.control.view_mode)).await;
            }
            UserCommand::RefreshNow => self.refresh(),
            UserCommand::ExportResults { path } => self.export(&path, ui_tx).await,
            UserCommand::Quit => {}
        }
        Ok(Flow::Continue)
    }

    fn put_up(&mut self, player: Player) {
        let action = Action::NextPlayer {
            player_name: player.name.clone(),
        };
        self.spawn_mutation(action, move |api, event_id| async move {
            api.next_player(&event_id, &player.id).await
        });
    }

    /// Engage the lock, fire the mutation and schedule the release. The
    /// release does not wait for the mutation.
    async fn record_sale(
        &mut self,
        intent: SaleIntent,
        route: SaleRoute,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) -> Result<(), ControlError> {
        let generation = self.control.engage_sale(&intent)?;
        self.poller.invalidate();
        self.reconcile_on_release = false;

        let action = Action::Sale {
            player_name: intent.player.name.clone(),
            team_name: intent.team.name.clone(),
            price: intent.price,
            route,
        };
        match route {
            SaleRoute::Transaction => {
                self.spawn_mutation(action, move |api, event_id| async move {
                    let sale = SaleRequest {
                        player_id: intent.player.id,
                        team_id: intent.team.id,
                        amount: intent.price,
                        event_id,
                    };
                    api.complete_transaction(&sale).await
                });
            }
            SaleRoute::Finalize => {
                self.spawn_mutation(action, move |api, event_id| async move {
                    api.finalize(&intent.player.id, &event_id).await
                });
            }
        }
        self.schedule_release(generation);

        self.push_timer(ui_tx).await;
        self.push_snapshot(ui_tx).await;
        Ok(())
    }

    async fn export(&self, path: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
        let c = &self.control;
        let notification = match export_results(Path::new(path), &c.players, &c.teams, &c.categories)
        {
            Ok(rows) => {
                info!(rows, path, "results exported");
                Notification::success(format!("Exported {rows} players to {path}"))
            }
            Err(e) => {
                warn!(path, "export failed: {}", e);
                Notification::error(format!("Export failed: {e}"))
            }
        };
        self.notify(ui_tx, notification).await;
    }

    // -- Internal events ----------------------------------------------------

    pub async fn handle_event(&mut self, event: AppEvent, ui_tx: &mpsc::Sender<UiUpdate>) -> Flow {
        match event {
            AppEvent::Polled(batch) => {
                if !self.poller.accept(batch.epoch, &self.control.lock) {
                    return Flow::Continue;
                }
                let was_stale = self.control.is_stale();
                self.control.apply_poll(*batch);
                if self.control.is_stale() && !was_stale {
                    warn!(
                        failures = self.control.consecutive_failures,
                        "showing stale data"
                    );
                }
                self.push_snapshot(ui_tx).await;
            }
            AppEvent::EventLoaded(Ok(event)) => {
                info!(name = %event.name, "event loaded");
                self.control.event = Some(event);
                self.push_snapshot(ui_tx).await;
            }
            AppEvent::EventLoaded(Err(e)) => warn!("could not load event details: {}", e),
            AppEvent::CategoriesLoaded(Ok(categories)) => {
                debug!(count = categories.len(), "categories loaded");
                self.control.categories = categories;
                self.push_snapshot(ui_tx).await;
            }
            AppEvent::CategoriesLoaded(Err(e)) => warn!("could not load categories: {}", e),
            AppEvent::Mutation { action, result } => {
                return self.mutation_finished(action, result, ui_tx).await;
            }
            AppEvent::LockExpired { generation } => {
                if self.control.lock.release(generation) {
                    info!(generation, "sale display finished");
                    self.lock_release = None;
                    self.push_snapshot(ui_tx).await;
                    if std::mem::take(&mut self.reconcile_on_release) {
                        self.refresh();
                    }
                } else {
                    debug!(generation, "ignoring release for an older sale");
                }
            }
        }
        Flow::Continue
    }

    async fn mutation_finished(
        &mut self,
        action: Action,
        result: Result<Ack, ApiError>,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) -> Flow {
        match result {
            Ok(ack) => {
                info!(?action, response = %ack.message, "mutation succeeded");
                let message = action.success_message(&self.currency, &ack);
                self.notify(ui_tx, Notification::success(message)).await;
                match action {
                    Action::NextPlayer { .. } => {
                        self.control.countdown.reset();
                        let restart = self.config.auto_start_timer;
                        if restart {
                            self.control.countdown.start();
                        }
                        self.push_timer(ui_tx).await;
                        self.refresh();
                        if restart {
                            return Flow::RestartCountdown;
                        }
                    }
                    // The server closed at its own bid, which may differ
                    // from the stamp.
                    Action::Sale {
                        route: SaleRoute::Finalize,
                        ..
                    } if self.control.lock.is_engaged() => self.reconcile_on_release = true,
                    // The poller picks the sale up on its own once the
                    // stamp comes down.
                    Action::Sale { .. } if self.control.lock.is_engaged() => {}
                    _ => self.refresh(),
                }
            }
            Err(e) => {
                warn!(?action, "mutation failed: {}", e);
                self.notify(ui_tx, Notification::error(action.failure_message(&e)))
                    .await;
                if matches!(action, Action::Sale { .. }) {
                    if self.control.lock.is_engaged() {
                        self.reconcile_on_release = true;
                    } else {
                        self.refresh();
                    }
                }
            }
        }
        Flow::Continue
    }

    // -- Countdown ----------------------------------------------------------

    pub async fn countdown_tick(&mut self, ui_tx: &mpsc::Sender<UiUpdate>) {
        match self.control.countdown.tick() {
            Tick::Idle => {}
            Tick::Running(_) => self.push_timer(ui_tx).await,
            Tick::Expired => {
                self.push_timer(ui_tx).await;
                let _ = ui_tx.send(UiUpdate::TimerExpired).await;
                let message = match self.control.current_player() {
                    Some(p) => format!("Time's up for {}", p.name),
                    None => "Time's up".to_string(),
                };
                info!("countdown expired");
                self.notify(ui_tx, Notification::info(message)).await;
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the control loop until `Quit` arrives or the command channel closes.
///
/// Fetches once immediately, then every `poll_interval_secs`. Every spawned
/// task is cancelled before this returns.
pub async fn run(
    mut event_rx: mpsc::Receiver<AppEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!(event_id = %state.control.event_id, "control loop started");

    state.load_event_details();
    let _ = ui_tx.send(UiUpdate::ViewMode(state.control.view_mode)).await;
    state.push_timer(&ui_tx).await;

    // First tick completes immediately: that is the on-start fetch.
    let mut poll_interval = tokio::time::interval(state.config.poll_interval());
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Missed seconds burst through so the countdown catches up after a stall.
    let mut countdown_interval = tokio::time::interval(COUNTDOWN_TICK);
    countdown_interval.tick().await;

    loop {
        let flow = tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(UserCommand::Quit) => {
                    info!("quit requested, shutting down");
                    break;
                }
                Some(cmd) => state.handle_command(cmd, &ui_tx).await,
                None => {
                    info!("command channel closed, shutting down");
                    break;
                }
            },

            Some(event) = event_rx.recv() => state.handle_event(event, &ui_tx).await,

            _ = poll_interval.tick() => {
                state.poll();
                Flow::Continue
            }

            _ = countdown_interval.tick() => {
                state.countdown_tick(&ui_tx).await;
                Flow::Continue
            }
        };

        if flow == Flow::RestartCountdown {
            countdown_interval.reset();
        }
    }

    state.shutdown();
    info!("control loop exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(message: &str) -> Ack {
        Ack {
            message: message.into(),
        }
    }

    #[test]
    fn sale_messages_include_price_and_team() {
        let action = Action::Sale {
            player_name: "Asha".into(),
            team_name: "Tigers".into(),
            price: 125_000,
            route: SaleRoute::Transaction,
        };
        assert_eq!(
            action.success_message("₹", &ack("Transaction completed")),
            "Asha sold to Tigers for ₹125,000"
        );
        let err = ApiError::Status {
            status: 400,
            detail: "Insufficient budget".into(),
        };
        assert_eq!(
            action.failure_message(&err),
            "Could not sell Asha to Tigers: Insufficient budget"
        );
    }

    #[test]
    fn finalize_message_follows_the_server_not_the_cache() {
        let action = Action::Finalize {
            player_name: "Asha".into(),
        };
        assert_eq!(
            action.success_message("₹", &ack("Bid finalized successfully")),
            "Asha sold at the closing bid"
        );
        assert_eq!(
            action.success_message("₹", &ack("Player marked as unsold")),
            "Asha went unsold"
        );
        assert_eq!(
            action.success_message("₹", &Ack::default()),
            "Bidding closed on Asha"
        );

        let stamped = Action::Sale {
            player_name: "Asha".into(),
            team_name: "Lions".into(),
            price: 18_000,
            route: SaleRoute::Finalize,
        };
        assert_eq!(
            stamped.success_message("₹", &ack("Player marked as unsold")),
            "Asha went unsold"
        );
    }

    #[test]
    fn failure_message_falls_back_to_error_text() {
        let action = Action::StartAuction;
        let err = ApiError::InvalidUrl("nope".into());
        assert_eq!(
            action.failure_message(&err),
            "Could not start the auction: invalid backend URL: nope"
        );
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("select a team first"), "Select a team first");
        assert_eq!(capitalize(""), "");
    }
}
