// Optimistic transition lock around a recorded sale.
//
// While engaged, the spotlight shows the frozen player and the SOLD stamp no
// matter what the server reports, and the poller neither starts nor applies
// fetches. Each engagement gets its own generation so a release timer left
// over from an earlier sale can never clear a later one.

use thiserror::Error;

use gavel_core::model::Player;
use gavel_core::protocol::SaleDisplay;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("a sale is already being shown")]
    AlreadyEngaged,
}

#[derive(Debug, Clone)]
struct Engagement {
    frozen_player: Player,
    display: SaleDisplay,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct TransitionLock {
    engaged: Option<Engagement>,
    generation: u64,
}

impl TransitionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze `player` on screen with the SOLD stamp. Returns the generation
    /// the matching release must present.
    pub fn engage(
        &mut self,
        player: Player,
        team_name: impl Into<String>,
        price: u64,
    ) -> Result<u64, LockError> {
        if self.engaged.is_some() {
            return Err(LockError::AlreadyEngaged);
        }
        self.generation += 1;
        let display = SaleDisplay {
            player_name: player.name.clone(),
            team_name: team_name.into(),
            price,
        };
        self.engaged = Some(Engagement {
            frozen_player: player,
            display,
            generation: self.generation,
        });
        Ok(self.generation)
    }

    /// Release the lock if `generation` is the current engagement.
    pub fn release(&mut self, generation: u64) -> bool {
        match &self.engaged {
            Some(e) if e.generation == generation => {
                self.engaged = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.is_some()
    }

    pub fn frozen_player(&self) -> Option<&Player> {
        self.engaged.as_ref().map(|e| &e.frozen_player)
    }

    pub fn display(&self) -> Option<&SaleDisplay> {
        self.engaged.as_ref().map(|e| &e.display)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
