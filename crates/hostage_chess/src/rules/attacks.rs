//! Attack and check detection.
//!
//! Only pieces physically on the board attack; hostages and reserves are invisible here.

use crate::board::Board;
use crate::position::Position;
use crate::types::{Color, PieceKind, Square};
use tracing::instrument;

pub(crate) const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// True iff `target` is attacked by any piece of colour `by`.
///
/// Walks outward from the target, so the cost does not depend on how many
/// pieces are on the board.
pub fn is_square_attacked(board: &Board, target: Square, by: Color) -> bool {
    let is = |sq: Square, kinds: &[PieceKind]| {
        board
            .get(sq)
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    // Pawns of `by` attack diagonally forward, so look one rank behind the target.
    let back = -by.forward();
    for df in [-1, 1] {
        if let Some(sq) = target.offset(df, back)
            && is(sq, &[PieceKind::Pawn])
        {
            return true;
        }
    }

    for (df, dr) in KNIGHT_STEPS {
        if let Some(sq) = target.offset(df, dr)
            && is(sq, &[PieceKind::Knight])
        {
            return true;
        }
    }

    for (df, dr) in KING_STEPS {
        if let Some(sq) = target.offset(df, dr)
            && is(sq, &[PieceKind::King])
        {
            return true;
        }
    }

    let sliders = [
        (ROOK_DIRS, [PieceKind::Rook, PieceKind::Queen]),
        (BISHOP_DIRS, [PieceKind::Bishop, PieceKind::Queen]),
    ];
    for (dirs, kinds) in sliders {
        for (df, dr) in dirs {
            let mut cur = target.offset(df, dr);
            while let Some(sq) = cur {
                if board.get(sq).is_some() {
                    if is(sq, &kinds) {
                        return true;
                    }
                    break;
                }
                cur = sq.offset(df, dr);
            }
        }
    }

    false
}

/// True iff the king of `color` is attacked on `board`.
///
/// A board without that king is reported as not in check.
pub fn king_attacked(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .is_some_and(|king| is_square_attacked(board, king, color.opposite()))
}

/// True iff `color`'s king is in check in `position`.
#[instrument(skip(position))]
pub fn is_in_check(position: &Position, color: Color) -> bool {
    king_attacked(position.board(), color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Piece;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn board_with(pieces: &[(&str, PieceKind, Color)]) -> Board {
        let mut board = Board::empty();
        for (label, kind, color) in pieces {
            board.set(sq(label), Some(Piece::new(*kind, *color)));
        }
        board
    }

    #[test]
    fn test_starting_position_has_no_check() {
        let pos = Position::starting();
        assert!(!is_in_check(&pos, Color::White));
        assert!(!is_in_check(&pos, Color::Black));
    }

    #[test]
    fn test_pawn_attacks_diagonally_forward() {
        let board = board_with(&[("e4", PieceKind::Pawn, Color::White)]);
        assert!(is_square_attacked(&board, sq("d5"), Color::White));
        assert!(is_square_attacked(&board, sq("f5"), Color::White));
        assert!(!is_square_attacked(&board, sq("e5"), Color::White));
        assert!(!is_square_attacked(&board, sq("d3"), Color::White));
    }

    #[test]
    fn test_slider_blocked_by_piece() {
        let board = board_with(&[
            ("a1", PieceKind::Rook, Color::Black),
            ("a4", PieceKind::Knight, Color::White),
        ]);
        assert!(is_square_attacked(&board, sq("a3"), Color::Black));
        assert!(is_square_attacked(&board, sq("a4"), Color::Black));
        assert!(!is_square_attacked(&board, sq("a5"), Color::Black));
    }

    #[test]
    fn test_king_attacked_by_bishop() {
        let board = board_with(&[
            ("e1", PieceKind::King, Color::White),
            ("b4", PieceKind::Bishop, Color::Black),
        ]);
        assert!(king_attacked(&board, Color::White));
    }
}
