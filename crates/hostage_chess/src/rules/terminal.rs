//! Board-only mate and stalemate detection.
//!
//! These ignore reserves: in Hostage Chess a drop may still rescue a side
//! that has no board move, so the turn controller layers drop-aware status
//! on top of them.

use super::attacks::is_in_check;
use super::movegen::has_legal_move;
use crate::position::Position;
use tracing::instrument;

/// Side to move is in check and has no legal board move.
#[instrument(skip(position))]
pub fn is_checkmate(position: &Position) -> bool {
    is_in_check(position, *position.side_to_move()) && !has_legal_move(position)
}

/// Side to move is not in check and has no legal board move.
#[instrument(skip(position))]
pub fn is_stalemate(position: &Position) -> bool {
    !is_in_check(position, *position.side_to_move()) && !has_legal_move(position)
}
