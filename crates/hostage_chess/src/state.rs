//! The full game state: position plus both sides' pools.

use crate::ledger::Ledger;
use crate::position::Position;
use crate::types::Color;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Everything the rules need to judge the next action.
///
/// This is what the position codec round-trips. The turn controller wraps
/// it with the game record and repetition history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct GameState {
    /// Board, side to move, castling, en passant and clocks.
    position: Position,
    /// Hostage and reserve pools.
    ledger: Ledger,
}

impl GameState {
    /// Standard starting position with empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a state from a position and a ledger.
    pub fn from_parts(position: Position, ledger: Ledger) -> Self {
        Self { position, ledger }
    }

    /// Side whose action is next.
    pub fn side_to_move(&self) -> Color {
        *self.position.side_to_move()
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Position, &mut Ledger) {
        (&mut self.position, &mut self.ledger)
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}
