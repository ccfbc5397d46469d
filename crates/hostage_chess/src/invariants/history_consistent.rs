//! History consistency invariant: one repetition key per state reached.

use super::Invariant;
use crate::codec::repetition_key;
use crate::game::Game;

/// Invariant: the repetition history has one entry more than the record,
/// and its last entry describes the current state.
pub struct HistoryConsistentInvariant;

impl Invariant<Game> for HistoryConsistentInvariant {
    fn holds(game: &Game) -> bool {
        let keys = game.repetition_keys();
        keys.len() == game.record().len() + 1
            && keys.last() == Some(&repetition_key(game.state()))
    }

    fn description() -> &'static str {
        "Repetition history matches the game record and current state"
    }
}
