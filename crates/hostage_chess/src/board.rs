//! The 8x8 board: a sparse mapping from squares to pieces.

use super::types::{Color, Piece, PieceKind, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of squares on the board.
pub const SQUARE_COUNT: usize = 64;

/// A serialized board did not hold exactly 64 squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Board must have {} squares, got {}", SQUARE_COUNT, len)]
pub struct BoardSizeError {
    /// Number of squares found.
    pub len: usize,
}

#[derive(Deserialize)]
struct RawBoard {
    squares: Vec<Option<Piece>>,
}

impl TryFrom<RawBoard> for Board {
    type Error = BoardSizeError;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        if raw.squares.len() != SQUARE_COUNT {
            return Err(BoardSizeError {
                len: raw.squares.len(),
            });
        }
        Ok(Self {
            squares: raw.squares,
        })
    }
}

/// Piece placement on the 64 squares.
///
/// Only pieces physically on the board live here; hostages and reserves are
/// held by the [`Ledger`](crate::Ledger) and never take part in attacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// Creates an empty board.
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARE_COUNT],
        }
    }

    /// Creates the standard initial array.
    #[instrument]
    pub fn starting() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = Self::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            for color in [Color::White, Color::Black] {
                let pawn_rank = (i16::from(color.back_rank()) + i16::from(color.forward())) as u8;
                if let Some(sq) = Square::new(file, color.back_rank()) {
                    board.set(sq, Some(Piece::new(*kind, color)));
                }
                if let Some(sq) = Square::new(file, pawn_rank) {
                    board.set(sq, Some(Piece::new(PieceKind::Pawn, color)));
                }
            }
        }
        board
    }

    /// Returns the piece on a square.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Places (or clears, with `None`) a square, returning what was there.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.squares[sq.index()], piece)
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Iterates occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Iterates the pieces of one colour.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }

    /// Locates the king of `color`, if present.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Counts the kings of `color`.
    pub fn king_count(&self, color: Color) -> usize {
        self.pieces_of(color)
            .filter(|(_, p)| p.kind == PieceKind::King)
            .count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let symbol = Square::new(file, rank)
                    .and_then(|sq| self.get(sq))
                    .map(Piece::to_char)
                    .unwrap_or('.');
                write!(f, "{}", symbol)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(label: &str) -> Square {
        label.parse().expect("valid square")
    }

    #[test]
    fn test_starting_board_layout() {
        let board = Board::starting();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(
            board.get(sq("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.get(sq("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(
            board.get(sq("a7")),
            Some(Piece::new(PieceKind::Pawn, Color::Black))
        );
        assert!(board.is_empty(sq("e4")));
    }

    #[test]
    fn test_king_lookup() {
        let board = Board::starting();
        assert_eq!(board.king_square(Color::White), Some(sq("e1")));
        assert_eq!(board.king_square(Color::Black), Some(sq("e8")));
        assert_eq!(board.king_count(Color::White), 1);
        assert_eq!(Board::empty().king_square(Color::White), None);
    }

    #[test]
    fn test_set_returns_previous() {
        let mut board = Board::starting();
        let previous = board.set(sq("e2"), None);
        assert_eq!(previous, Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert!(board.is_empty(sq("e2")));
    }

    #[test]
    fn test_deserialize_rejects_short_board() {
        let result: Result<Board, _> = serde_json::from_str(r#"{"squares":[null]}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("got 1"), "{err}");
    }

    #[test]
    fn test_serde_keeps_full_board() {
        let json = serde_json::to_string(&Board::starting()).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Board::starting());
    }

    #[test]
    fn test_display_renders_ranks_top_down() {
        let rendered = Board::starting().to_string();
        let first = rendered.lines().next().unwrap();
        assert_eq!(first, "8 r n b q k b n r");
        assert!(rendered.ends_with("a b c d e f g h"));
    }
}
