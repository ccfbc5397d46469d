//! Pool contents have the right colours and never hold a king.

use super::Invariant;
use crate::game::Game;
use crate::types::{Color, PieceKind};
use strum::IntoEnumIterator;

/// Invariant: hostages are opponent-coloured non-kings, reserves are non-kings.
pub struct PoolsWellFormedInvariant;

impl Invariant<Game> for PoolsWellFormedInvariant {
    fn holds(game: &Game) -> bool {
        let ledger = game.state().ledger();
        Color::iter().all(|holder| {
            let hostages_ok = ledger
                .hostages(holder)
                .iter()
                .all(|p| p.color == holder.opposite() && p.kind != PieceKind::King);
            let reserves_ok = ledger
                .reserves(holder)
                .iter()
                .all(|k| *k != PieceKind::King);
            hostages_ok && reserves_ok
        })
    }

    fn description() -> &'static str {
        "Hostages belong to the holder's opponent and no pool holds a king"
    }
}
