//! Exactly one king of each colour stands on the board.

use super::Invariant;
use crate::game::Game;
use crate::types::Color;
use strum::IntoEnumIterator;

/// Invariant: each side has exactly one king, and it is on the board.
///
/// Kings are never captured and never enter a pool.
pub struct KingsOnBoardInvariant;

impl Invariant<Game> for KingsOnBoardInvariant {
    fn holds(game: &Game) -> bool {
        let board = game.state().position().board();
        Color::iter().all(|color| board.king_count(color) == 1)
    }

    fn description() -> &'static str {
        "Each side has exactly one king on the board"
    }
}
