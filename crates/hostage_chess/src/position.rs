//! Board position: placement plus side to move, castling, en passant and clocks.

use super::board::Board;
use super::types::{Color, Square};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// The four castling permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    /// White may castle short (O-O).
    pub white_kingside: bool,
    /// White may castle long (O-O-O).
    pub white_queenside: bool,
    /// Black may castle short.
    pub black_kingside: bool,
    /// Black may castle long.
    pub black_queenside: bool,
}

impl CastlingRights {
    /// All four rights, as at the start of a game.
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    /// No rights at all.
    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    /// Kingside right for `color`.
    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    /// Queenside right for `color`.
    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// Drops both rights of `color` (king moved).
    pub fn revoke(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drops the right tied to a rook's home square, if `sq` is one.
    pub fn revoke_rook_square(&mut self, sq: Square) {
        match (sq.file(), sq.rank()) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

/// A complete chess position, excluding hostage and reserve pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Position {
    /// Piece placement.
    board: Board,
    /// Side whose action is next.
    side_to_move: Color,
    /// Remaining castling permissions.
    castling: CastlingRights,
    /// Square skipped by the last double pawn push.
    en_passant: Option<Square>,
    /// Plies since the last capture, pawn move, drop or exchange.
    halfmove_clock: u32,
    /// Starts at 1, increments after each Black action.
    fullmove_number: u32,
}

impl Position {
    /// Standard starting position.
    #[instrument]
    pub fn starting() -> Self {
        Self {
            board: Board::starting(),
            side_to_move: Color::White,
            castling: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Assembles a position from its parts.
    pub fn from_parts(
        board: Board,
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Self {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub(crate) fn castling_mut(&mut self) -> &mut CastlingRights {
        &mut self.castling
    }

    pub(crate) fn set_en_passant(&mut self, target: Option<Square>) {
        self.en_passant = target;
    }

    /// Closes the ply: clocks updated and the turn handed over.
    ///
    /// `irreversible` resets the halfmove clock (capture, pawn move, drop, exchange).
    pub(crate) fn finish_ply(&mut self, irreversible: bool) {
        if irreversible {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = self.side_to_move.opposite();
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}
