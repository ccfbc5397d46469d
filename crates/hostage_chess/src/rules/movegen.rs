//! Legal move generation and move application.

use super::attacks::{
    BISHOP_DIRS, KING_STEPS, KNIGHT_STEPS, ROOK_DIRS, is_square_attacked, king_attacked,
};
use crate::position::Position;
use crate::types::{Color, Piece, PieceKind, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Why a move was refused by the board core.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, Serialize, Deserialize)]
pub enum MoveError {
    /// Nothing stands on the origin square.
    #[display("No piece on {}", _0)]
    NoPiece(#[error(not(source))] Square),

    /// The piece on the origin square belongs to the side not on move.
    #[display("Piece on {} does not belong to the side to move", _0)]
    NotYourPiece(#[error(not(source))] Square),

    /// The destination is not among the piece's legal destinations.
    #[display("{} -> {} is not a legal move", from, to)]
    IllegalDestination {
        /// Origin square.
        from: Square,
        /// Rejected destination.
        to: Square,
    },

    /// Promotion requested to a pawn or king.
    #[display("Cannot promote to {}", _0)]
    InvalidPromotion(#[error(not(source))] PieceKind),

    /// Promotion piece supplied for a move that does not promote.
    #[display("{} -> {} is not a promotion", from, to)]
    UnexpectedPromotion {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
    },
}

/// A piece removed from the board by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// The captured piece as it stood on the board.
    pub piece: Piece,
    /// Where it stood (differs from the destination for en passant).
    pub square: Square,
}

/// Result of applying a legal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Position after the move, with the turn handed over.
    pub position: Position,
    /// Captured piece, if any.
    pub capture: Option<Capture>,
    /// Kind the pawn promoted to, if it promoted.
    pub promotion: Option<PieceKind>,
    /// Whether the move was a castle.
    pub castled: bool,
}

fn is_promotion_move(piece: Piece, to: Square) -> bool {
    piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank()
}

fn push_steps(
    position: &Position,
    from: Square,
    color: Color,
    steps: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(df, dr) in steps {
        if let Some(to) = from.offset(df, dr)
            && position.board().get(to).is_none_or(|p| p.color != color)
        {
            out.push(to);
        }
    }
}

fn push_rays(
    position: &Position,
    from: Square,
    color: Color,
    dirs: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(df, dr) in dirs {
        let mut cur = from.offset(df, dr);
        while let Some(to) = cur {
            match position.board().get(to) {
                None => out.push(to),
                Some(p) => {
                    if p.color != color {
                        out.push(to);
                    }
                    break;
                }
            }
            cur = to.offset(df, dr);
        }
    }
}

fn push_pawn_moves(position: &Position, from: Square, color: Color, out: &mut Vec<Square>) {
    let board = position.board();
    let fwd = color.forward();

    if let Some(one) = from.offset(0, fwd)
        && board.is_empty(one)
    {
        out.push(one);
        let start_rank = (i16::from(color.back_rank()) + i16::from(fwd)) as u8;
        if from.rank() == start_rank
            && let Some(two) = from.offset(0, 2 * fwd)
            && board.is_empty(two)
        {
            out.push(two);
        }
    }

    let en_passant = en_passant_victim(position).and(*position.en_passant());
    for df in [-1, 1] {
        if let Some(to) = from.offset(df, fwd) {
            let enemy = board.get(to).is_some_and(|p| p.color != color);
            if enemy || en_passant == Some(to) {
                out.push(to);
            }
        }
    }
}

/// Square of the pawn an en passant capture would remove.
///
/// `None` unless the recorded target is empty, an enemy pawn stands just
/// beyond it and the square that pawn left is empty.
pub fn en_passant_victim(position: &Position) -> Option<Square> {
    let target = (*position.en_passant())?;
    let side = *position.side_to_move();
    let board = position.board();
    let victim = target.offset(0, -side.forward())?;
    let origin = target.offset(0, side.forward())?;
    let pawn = Piece::new(PieceKind::Pawn, side.opposite());
    (board.is_empty(target) && board.is_empty(origin) && board.get(victim) == Some(pawn))
        .then_some(victim)
}

/// Whether the side to move has a legal en passant capture.
pub fn can_capture_en_passant(position: &Position) -> bool {
    let (Some(target), Some(victim)) = (*position.en_passant(), en_passant_victim(position))
    else {
        return false;
    };
    let pawn = Piece::new(PieceKind::Pawn, *position.side_to_move());
    [-1, 1].into_iter().any(|df| {
        victim.offset(df, 0).is_some_and(|from| {
            position.board().get(from) == Some(pawn) && keeps_king_safe(position, from, target, pawn)
        })
    })
}

fn push_castles(position: &Position, from: Square, color: Color, out: &mut Vec<Square>) {
    let board = position.board();
    let rank = color.back_rank();
    if from.file() != 4 || from.rank() != rank {
        return;
    }
    let enemy = color.opposite();
    if is_square_attacked(board, from, enemy) {
        return;
    }

    let rook_home = |file: u8| {
        Square::new(file, rank).is_some_and(|sq| {
            board.get(sq) == Some(Piece::new(PieceKind::Rook, color))
        })
    };
    let empty = |files: &[u8]| {
        files
            .iter()
            .all(|&f| Square::new(f, rank).is_some_and(|sq| board.is_empty(sq)))
    };
    let safe = |files: &[u8]| {
        files.iter().all(|&f| {
            Square::new(f, rank).is_some_and(|sq| !is_square_attacked(board, sq, enemy))
        })
    };

    if position.castling().kingside(color) && rook_home(7) && empty(&[5, 6]) && safe(&[5, 6]) {
        out.extend(Square::new(6, rank));
    }
    if position.castling().queenside(color) && rook_home(0) && empty(&[1, 2, 3]) && safe(&[2, 3])
    {
        out.extend(Square::new(2, rank));
    }
}

/// Destinations reachable by movement rules alone, ignoring self-check.
fn pseudo_destinations(position: &Position, from: Square, piece: Piece) -> Vec<Square> {
    let mut out = Vec::new();
    let color = piece.color;
    match piece.kind {
        PieceKind::Pawn => push_pawn_moves(position, from, color, &mut out),
        PieceKind::Knight => push_steps(position, from, color, &KNIGHT_STEPS, &mut out),
        PieceKind::Bishop => push_rays(position, from, color, &BISHOP_DIRS, &mut out),
        PieceKind::Rook => push_rays(position, from, color, &ROOK_DIRS, &mut out),
        PieceKind::Queen => {
            push_rays(position, from, color, &ROOK_DIRS, &mut out);
            push_rays(position, from, color, &BISHOP_DIRS, &mut out);
        }
        PieceKind::King => {
            push_steps(position, from, color, &KING_STEPS, &mut out);
            push_castles(position, from, color, &mut out);
        }
    }
    out
}

/// Plays a pseudo-legal move on a copy of the position without legality checks.
fn make_move(
    position: &Position,
    from: Square,
    to: Square,
    piece: Piece,
    promotion: PieceKind,
) -> MoveOutcome {
    let en_passant = en_passant_victim(position)
        .filter(|_| piece.kind == PieceKind::Pawn && *position.en_passant() == Some(to));
    let mut next = position.clone();
    let color = piece.color;
    let board = next.board_mut();

    board.set(from, None);
    let mut capture = board
        .set(to, Some(piece))
        .map(|captured| Capture { piece: captured, square: to });

    let mut castled = false;
    let mut promoted = None;
    match piece.kind {
        PieceKind::Pawn => {
            if let Some(victim_sq) = en_passant
                && capture.is_none()
                && from.file() != to.file()
            {
                capture = board
                    .set(victim_sq, None)
                    .map(|captured| Capture { piece: captured, square: victim_sq });
            }
            if is_promotion_move(piece, to) {
                board.set(to, Some(Piece::new(promotion, color)));
                promoted = Some(promotion);
            }
        }
        PieceKind::King if from.file().abs_diff(to.file()) == 2 => {
            let (rook_from, rook_to) = if to.file() == 6 { (7, 5) } else { (0, 3) };
            if let (Some(rf), Some(rt)) = (
                Square::new(rook_from, to.rank()),
                Square::new(rook_to, to.rank()),
            ) {
                let rook = board.set(rf, None);
                board.set(rt, rook);
            }
            castled = true;
        }
        _ => {}
    }

    let castling = next.castling_mut();
    if piece.kind == PieceKind::King {
        castling.revoke(color);
    }
    castling.revoke_rook_square(from);
    castling.revoke_rook_square(to);

    let double_push = piece.kind == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2;
    let ep = if double_push {
        from.offset(0, color.forward())
    } else {
        None
    };
    next.set_en_passant(ep);
    next.finish_ply(capture.is_some() || piece.kind == PieceKind::Pawn);

    MoveOutcome {
        position: next,
        capture,
        promotion: promoted,
        castled,
    }
}

/// Whether playing `from -> to` leaves the mover's own king safe.
fn keeps_king_safe(position: &Position, from: Square, to: Square, piece: Piece) -> bool {
    let after = make_move(position, from, to, piece, PieceKind::Queen);
    !king_attacked(after.position.board(), piece.color)
}

/// Legal destinations for the piece on `from`.
///
/// Yields nothing when the square is empty or holds a piece of the side not
/// on move. Destinations are filtered lazily: a candidate is only played out
/// to test for self-check when the iterator reaches it.
pub fn legal_moves(position: &Position, from: Square) -> impl Iterator<Item = Square> + '_ {
    let piece = position
        .board()
        .get(from)
        .filter(|p| p.color == *position.side_to_move());
    let candidates = piece
        .map(|p| pseudo_destinations(position, from, p))
        .unwrap_or_default();
    candidates
        .into_iter()
        .filter(move |&to| piece.is_some_and(|p| keeps_king_safe(position, from, to, p)))
}

/// Whether the side to move has at least one legal board move.
pub fn has_legal_move(position: &Position) -> bool {
    position
        .board()
        .pieces_of(*position.side_to_move())
        .any(|(from, _)| legal_moves(position, from).next().is_some())
}

/// Every legal `(from, to)` pair for the side to move.
pub fn all_legal_moves(position: &Position) -> Vec<(Square, Square)> {
    position
        .board()
        .pieces_of(*position.side_to_move())
        .flat_map(|(from, _)| legal_moves(position, from).map(move |to| (from, to)))
        .collect()
}

/// Whether moving the piece on `from` to `to` would promote it.
pub fn is_promotion(position: &Position, from: Square, to: Square) -> bool {
    position
        .board()
        .get(from)
        .is_some_and(|p| is_promotion_move(p, to))
}

/// Validates and applies a move, returning the next position.
///
/// A pawn reaching the last rank without an explicit `promotion` becomes a queen.
///
/// # Errors
///
/// Returns a [`MoveError`] if there is no piece of the side to move on `from`,
/// if `to` is not a legal destination, or if the promotion piece is unusable.
#[instrument(skip(position), fields(side = %position.side_to_move()))]
pub fn apply_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<MoveOutcome, MoveError> {
    let piece = position.board().get(from).ok_or(MoveError::NoPiece(from))?;
    if piece.color != *position.side_to_move() {
        warn!(%from, "Move of opponent's piece rejected");
        return Err(MoveError::NotYourPiece(from));
    }

    if !legal_moves(position, from).any(|sq| sq == to) {
        warn!(%from, %to, "Destination not in legal set");
        return Err(MoveError::IllegalDestination { from, to });
    }

    let promotes = is_promotion_move(piece, to);
    let kind = match (promotes, promotion) {
        (false, Some(_)) => return Err(MoveError::UnexpectedPromotion { from, to }),
        (true, Some(kind)) if !kind.is_promotion_target() => {
            return Err(MoveError::InvalidPromotion(kind));
        }
        (_, Some(kind)) => kind,
        (_, None) => PieceKind::Queen,
    };

    let outcome = make_move(position, from, to, piece, kind);
    debug!(
        %from,
        %to,
        capture = ?outcome.capture,
        promotion = ?outcome.promotion,
        castled = outcome.castled,
        "Move applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::position::CastlingRights;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn play(position: &Position, from: &str, to: &str) -> Position {
        apply_move(position, sq(from), sq(to), None)
            .expect("legal move")
            .position
    }

    fn custom(pieces: &[(&str, PieceKind, Color)], side: Color, castling: CastlingRights) -> Position {
        let mut board = Board::empty();
        for (label, kind, color) in pieces {
            board.set(sq(label), Some(Piece::new(*kind, *color)));
        }
        Position::from_parts(board, side, castling, None, 0, 1)
    }

    #[test]
    fn test_starting_position_has_twenty_moves() {
        assert_eq!(all_legal_moves(&Position::starting()).len(), 20);
    }

    #[test]
    fn test_knight_moves_from_start() {
        let mut dests: Vec<_> = legal_moves(&Position::starting(), sq("g1")).collect();
        dests.sort();
        assert_eq!(dests, vec![sq("f3"), sq("h3")]);
    }

    #[test]
    fn test_wrong_color_has_no_moves() {
        assert_eq!(legal_moves(&Position::starting(), sq("e7")).count(), 0);
        assert_eq!(legal_moves(&Position::starting(), sq("e4")).count(), 0);
    }

    #[test]
    fn test_double_push_sets_en_passant() {
        let pos = play(&Position::starting(), "e2", "e4");
        assert_eq!(*pos.en_passant(), Some(sq("e3")));
        assert_eq!(*pos.side_to_move(), Color::Black);
        let pos = play(&pos, "g8", "f6");
        assert_eq!(*pos.en_passant(), None);
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let mut pos = Position::starting();
        for (from, to) in [("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")] {
            pos = play(&pos, from, to);
        }
        let outcome = apply_move(&pos, sq("e5"), sq("d6"), None).unwrap();
        let capture = outcome.capture.expect("en passant captures");
        assert_eq!(capture.square, sq("d5"));
        assert_eq!(capture.piece, Piece::new(PieceKind::Pawn, Color::Black));
        assert!(outcome.position.board().is_empty(sq("d5")));
    }

    #[test]
    fn test_en_passant_target_without_pawn_is_ignored() {
        let base = custom(
            &[
                ("e1", PieceKind::King, Color::White),
                ("d5", PieceKind::Pawn, Color::White),
                ("e5", PieceKind::Queen, Color::Black),
                ("e8", PieceKind::King, Color::Black),
            ],
            Color::White,
            CastlingRights::none(),
        );
        let pos = Position::from_parts(
            base.board().clone(),
            Color::White,
            CastlingRights::none(),
            Some(sq("e6")),
            0,
            1,
        );
        assert_eq!(en_passant_victim(&pos), None);
        assert!(!can_capture_en_passant(&pos));
        let dests: Vec<_> = legal_moves(&pos, sq("d5")).collect();
        assert_eq!(dests, vec![sq("d6")]);
        assert!(apply_move(&pos, sq("d5"), sq("e6"), None).is_err());
    }

    #[test]
    fn test_can_capture_en_passant_needs_adjacent_pawn() {
        let pos = play(&Position::starting(), "e2", "e4");
        assert_eq!(en_passant_victim(&pos), Some(sq("e4")));
        assert!(!can_capture_en_passant(&pos));

        let mut pos = Position::starting();
        for (from, to) in [("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")] {
            pos = play(&pos, from, to);
        }
        assert!(can_capture_en_passant(&pos));
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let pos = custom(
            &[
                ("e1", PieceKind::King, Color::White),
                ("e2", PieceKind::Knight, Color::White),
                ("e8", PieceKind::Rook, Color::Black),
                ("a8", PieceKind::King, Color::Black),
            ],
            Color::White,
            CastlingRights::none(),
        );
        assert_eq!(legal_moves(&pos, sq("e2")).count(), 0);
    }

    #[test]
    fn test_castling_kingside_moves_rook() {
        let pos = custom(
            &[
                ("e1", PieceKind::King, Color::White),
                ("h1", PieceKind::Rook, Color::White),
                ("e8", PieceKind::King, Color::Black),
            ],
            Color::White,
            CastlingRights::all(),
        );
        assert!(legal_moves(&pos, sq("e1")).any(|s| s == sq("g1")));
        let outcome = apply_move(&pos, sq("e1"), sq("g1"), None).unwrap();
        assert!(outcome.castled);
        assert_eq!(
            outcome.position.board().get(sq("f1")),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert!(!outcome.position.castling().kingside(Color::White));
    }

    #[test]
    fn test_cannot_castle_through_attack() {
        let pos = custom(
            &[
                ("e1", PieceKind::King, Color::White),
                ("h1", PieceKind::Rook, Color::White),
                ("f8", PieceKind::Rook, Color::Black),
                ("a8", PieceKind::King, Color::Black),
            ],
            Color::White,
            CastlingRights::all(),
        );
        assert!(!legal_moves(&pos, sq("e1")).any(|s| s == sq("g1")));
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let pos = custom(
            &[
                ("a7", PieceKind::Pawn, Color::White),
                ("e1", PieceKind::King, Color::White),
                ("e8", PieceKind::King, Color::Black),
            ],
            Color::White,
            CastlingRights::none(),
        );
        let outcome = apply_move(&pos, sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(outcome.promotion, Some(PieceKind::Queen));
        let under = apply_move(&pos, sq("a7"), sq("a8"), Some(PieceKind::Knight)).unwrap();
        assert_eq!(
            under.position.board().get(sq("a8")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
        assert_eq!(
            apply_move(&pos, sq("a7"), sq("a8"), Some(PieceKind::King)),
            Err(MoveError::InvalidPromotion(PieceKind::King))
        );
    }

    #[test]
    fn test_promotion_on_plain_move_rejected() {
        let result = apply_move(&Position::starting(), sq("e2"), sq("e4"), Some(PieceKind::Queen));
        assert!(matches!(result, Err(MoveError::UnexpectedPromotion { .. })));
    }

    #[test]
    fn test_illegal_destination_rejected() {
        let result = apply_move(&Position::starting(), sq("e2"), sq("e5"), None);
        assert!(matches!(result, Err(MoveError::IllegalDestination { .. })));
        let result = apply_move(&Position::starting(), sq("e7"), sq("e5"), None);
        assert_eq!(result, Err(MoveError::NotYourPiece(sq("e7"))));
    }

    #[test]
    fn test_no_legal_move_leaves_king_in_check() {
        let mut pos = Position::starting();
        for (from, to) in [("e2", "e4"), ("f7", "f6"), ("d1", "h5")] {
            pos = play(&pos, from, to);
        }
        for (from, to) in all_legal_moves(&pos) {
            let after = apply_move(&pos, from, to, None).unwrap();
            assert!(!king_attacked(after.position.board(), Color::Black));
        }
    }
}
