//! Draw detection: fifty-move rule, repetition and insufficient material.

use crate::board::Board;
use crate::position::Position;
use crate::types::{Color, PieceKind};
use tracing::instrument;

/// Halfmove clock value at which the fifty-move rule applies.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Fifty full moves without a capture, pawn move, drop or exchange.
#[instrument(skip(position))]
pub fn fifty_move_rule(position: &Position) -> bool {
    *position.halfmove_clock() >= FIFTY_MOVE_PLIES
}

/// The latest entry of `history` occurs at least three times.
///
/// `history` holds one repetition key per position reached, oldest first;
/// the turn controller owns it.
#[instrument(skip(history), fields(len = history.len()))]
pub fn threefold_repetition<K: PartialEq>(history: &[K]) -> bool {
    match history.last() {
        Some(current) => history.iter().filter(|k| *k == current).count() >= 3,
        None => false,
    }
}

/// Neither side has mating material on the board.
///
/// Covers bare kings and a single minor piece against a bare king. Pools are
/// not considered here; see the turn controller for the variant-aware rule.
#[instrument(skip(board))]
pub fn insufficient_material(board: &Board) -> bool {
    let minors = |color: Color| -> Option<usize> {
        let mut count = 0;
        for (_, piece) in board.pieces_of(color) {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => count += 1,
                _ => return None,
            }
        }
        Some(count)
    };

    match (minors(Color::White), minors(Color::Black)) {
        (Some(w), Some(b)) => w + b <= 1,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::CastlingRights;
    use crate::types::{Piece, Square};

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn kings_plus(extra: &[(&str, PieceKind, Color)]) -> Board {
        let mut board = Board::empty();
        board.set(sq("e1"), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(sq("e8"), Some(Piece::new(PieceKind::King, Color::Black)));
        for (label, kind, color) in extra {
            board.set(sq(label), Some(Piece::new(*kind, *color)));
        }
        board
    }

    #[test]
    fn test_bare_kings_insufficient() {
        assert!(insufficient_material(&kings_plus(&[])));
    }

    #[test]
    fn test_single_minor_insufficient() {
        assert!(insufficient_material(&kings_plus(&[(
            "c3",
            PieceKind::Knight,
            Color::White
        )])));
    }

    #[test]
    fn test_rook_or_two_minors_sufficient() {
        assert!(!insufficient_material(&kings_plus(&[(
            "a1",
            PieceKind::Rook,
            Color::White
        )])));
        assert!(!insufficient_material(&kings_plus(&[
            ("c1", PieceKind::Bishop, Color::White),
            ("c8", PieceKind::Bishop, Color::Black),
        ])));
        assert!(!insufficient_material(&Board::starting()));
    }

    #[test]
    fn test_fifty_move_threshold() {
        let pos = Position::from_parts(kings_plus(&[]), Color::White, CastlingRights::none(), None, 99, 80);
        assert!(!fifty_move_rule(&pos));
        let pos = Position::from_parts(kings_plus(&[]), Color::White, CastlingRights::none(), None, 100, 80);
        assert!(fifty_move_rule(&pos));
    }

    #[test]
    fn test_threefold_counts_latest_key() {
        assert!(!threefold_repetition::<&str>(&[]));
        assert!(!threefold_repetition(&["a", "b", "a", "b"]));
        assert!(threefold_repetition(&["a", "b", "a", "b", "a"]));
    }
}
