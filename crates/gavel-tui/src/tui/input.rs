// Keyboard input handling.
//
// Translates crossterm key events into `UserCommand`s for the control loop,
// or into local `ViewState` changes (selection, filter, the sale form).

use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use gavel_core::model::PlayerStatus;
use gavel_core::protocol::UserCommand;

use super::{SaleForm, SaleTarget, ViewState};

/// Longest price the form accepts, in digits.
const MAX_PRICE_DIGITS: usize = 12;

/// Rows skipped by PageUp/PageDown in the player list.
const PAGE_STEP: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key should reach the control loop,
/// `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm on Windows reports Release as well as Press.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.sale_form.is_some() {
        return handle_sale_form(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('s') => Some(UserCommand::StartAuction),
        KeyCode::Char('p') => Some(UserCommand::PauseAuction),
        KeyCode::Char('n') => Some(UserCommand::RandomNextPlayer),
        KeyCode::Enter => view_state
            .selected_player()
            .filter(|p| p.status == PlayerStatus::Available)
            .map(|p| UserCommand::NextPlayer {
                player_id: p.id.clone(),
            }),

        KeyCode::Up | KeyCode::Char('k') => {
            move_selection(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_selection(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            move_selection(view_state, -(PAGE_STEP as isize));
            None
        }
        KeyCode::PageDown => {
            move_selection(view_state, PAGE_STEP as isize);
            None
        }
        KeyCode::Char('v') => {
            view_state.player_filter = view_state.player_filter.next();
            view_state.selected = 0;
            None
        }

        KeyCode::Char('t') => Some(UserCommand::StartTimer),
        KeyCode::Char(' ') => {
            if view_state.timer.active {
                Some(UserCommand::PauseTimer)
            } else {
                Some(UserCommand::ResumeTimer)
            }
        }
        KeyCode::Char('r') => Some(UserCommand::ResetTimer),

        KeyCode::Char('b') => {
            open_current_sale(view_state);
            None
        }
        KeyCode::Char('d') => {
            open_direct_sale(view_state);
            None
        }
        KeyCode::Char('F') => Some(UserCommand::FinalizeCurrent),
        KeyCode::Char('u') => view_state.selected_player().map(|p| UserCommand::MarkUnsold {
            player_id: p.id.clone(),
        }),
        KeyCode::Char('a') => view_state
            .selected_player()
            .map(|p| UserCommand::MakeAvailable {
                player_id: p.id.clone(),
            }),

        KeyCode::Char('f') => Some(UserCommand::ToggleViewMode),
        KeyCode::Char('R') => Some(UserCommand::RefreshNow),
        KeyCode::Char('e') => Some(UserCommand::ExportResults {
            path: results_file_name(
                view_state.snapshot.event_name.as_deref(),
                Local::now().date_naive(),
            ),
        }),
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// y/q confirm, n/Esc cancel, everything else is swallowed.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('q') => Some(UserCommand::Quit),
        KeyCode::Char('n') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_sale_form(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let team_count = view_state.snapshot.teams.len();
    let form = view_state.sale_form.as_mut()?;

    match key_event.code {
        KeyCode::Esc => {
            view_state.sale_form = None;
            None
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if form.price.len() < MAX_PRICE_DIGITS {
                form.price.push(c);
            }
            None
        }
        KeyCode::Backspace => {
            form.price.pop();
            None
        }
        KeyCode::Char('[') | KeyCode::Left | KeyCode::BackTab => {
            form.team = cycle_team(form.team, team_count, false);
            None
        }
        KeyCode::Char(']') | KeyCode::Right | KeyCode::Tab => {
            form.team = cycle_team(form.team, team_count, true);
            None
        }
        KeyCode::Enter => {
            let form = view_state.sale_form.take()?;
            let team_id = form
                .team
                .and_then(|i| view_state.snapshot.teams.get(i))
                .map(|t| t.id.clone());
            let price = form.price_value();
            Some(match form.target {
                SaleTarget::Current => UserCommand::RecordSale { team_id, price },
                SaleTarget::Direct { player_id } => UserCommand::DirectSale {
                    player_id,
                    team_id,
                    price,
                },
            })
        }
        _ => None,
    }
}

fn move_selection(view_state: &mut ViewState, delta: isize) {
    let len = view_state.visible_players().len();
    if len == 0 {
        view_state.selected = 0;
        return;
    }
    let next = view_state.selected as isize + delta;
    view_state.selected = next.clamp(0, len as isize - 1) as usize;
}

fn cycle_team(current: Option<usize>, count: usize, forward: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(match (current, forward) {
        (None, true) => 0,
        (None, false) => count - 1,
        (Some(i), true) => (i + 1) % count,
        (Some(i), false) => (i + count - 1) % count,
    })
}

/// Open the sale form for the player on the block, prefilled with the
/// leading bid (or the base price) and the leading team.
fn open_current_sale(view_state: &mut ViewState) {
    let snapshot = &view_state.snapshot;
    let Some(player) = &snapshot.current_player else {
        return;
    };
    let price = snapshot.current_bid.unwrap_or(player.base_price);
    let team = snapshot
        .leading_team
        .as_deref()
        .and_then(|name| snapshot.teams.iter().position(|t| t.name == name));
    view_state.sale_form = Some(SaleForm {
        target: SaleTarget::Current,
        player_name: player.name.clone(),
        team,
        price: price.to_string(),
    });
}

fn open_direct_sale(view_state: &mut ViewState) {
    let Some(player) = view_state.selected_player() else {
        return;
    };
    if player.status == PlayerStatus::Sold {
        return;
    }
    let form = SaleForm {
        target: SaleTarget::Direct {
            player_id: player.id.clone(),
        },
        player_name: player.name.clone(),
        team: None,
        price: player.base_price.to_string(),
    };
    view_state.sale_form = Some(form);
}

/// `Harbour League 2026` on 2026-10-18 becomes
/// `Harbour_League_2026_Results_2026-10-18.csv`.
pub fn results_file_name(event_name: Option<&str>, date: NaiveDate) -> String {
    let name: String = event_name
        .unwrap_or("Auction")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_Results_{}.csv", name, date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
