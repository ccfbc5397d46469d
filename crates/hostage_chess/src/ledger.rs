//! Hostage and reserve pools for both sides.
//!
//! Captured pieces are not removed from play: the capturer holds them as
//! hostages. A hostage can be traded for one of the capturer's own pieces
//! held by the opponent, and both freed pieces land in their owners'
//! reserves, ready to be dropped back on the board.

use crate::board::Board;
use crate::types::{Color, Piece, PieceKind, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Why an exchange was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, Serialize, Deserialize)]
pub enum ExchangeError {
    /// An index does not select an entry of the named pool.
    #[display("{} holds no hostage at index {}", holder, index)]
    NoSuchHostage {
        /// Colour whose hostage pool was indexed.
        holder: Color,
        /// Out-of-range index.
        index: usize,
    },

    /// The offered hostage is worth less than the one requested.
    #[display("Offered {} is worth less than {}", offered, target)]
    InsufficientValue {
        /// Hostage being surrendered.
        offered: Piece,
        /// Hostage being released.
        target: Piece,
    },
}

/// Why a drop was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, Serialize, Deserialize)]
pub enum DropError {
    /// The reserve holds no piece of this kind.
    #[display("{} has no {} in reserve", color, kind)]
    EmptyReserve {
        /// Dropping side.
        color: Color,
        /// Requested kind.
        kind: PieceKind,
    },

    /// The target square is taken.
    #[display("Square {} is occupied", _0)]
    SquareOccupied(#[error(not(source))] Square),

    /// A pawn may not be dropped on the first or last rank.
    #[display("A {} cannot be dropped on {}", kind, square)]
    IllegalDropSquare {
        /// Dropped kind.
        kind: PieceKind,
        /// Refused square.
        square: Square,
    },
}

/// Pieces moved by a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    /// Enemy hostage given up; now in the opponent's reserve.
    pub surrendered: Piece,
    /// Own piece freed from the opponent; now in the actor's reserve.
    pub released: Piece,
}

/// Hostage and reserve pools, indexed by holder colour.
///
/// `hostages[c]` holds pieces of the opposite colour captured by `c`;
/// `reserves[c]` holds kinds of `c`'s own colour waiting to be dropped.
/// Pool order is significant: exchanges address hostages by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ledger {
    hostages: [Vec<Piece>; 2],
    reserves: [Vec<PieceKind>; 2],
}

impl Ledger {
    /// Creates empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from explicit pool contents.
    pub fn from_pools(hostages: [Vec<Piece>; 2], reserves: [Vec<PieceKind>; 2]) -> Self {
        Self { hostages, reserves }
    }

    /// Hostages held by `holder`.
    pub fn hostages(&self, holder: Color) -> &[Piece] {
        &self.hostages[holder.index()]
    }

    /// Reserve of `owner`.
    pub fn reserves(&self, owner: Color) -> &[PieceKind] {
        &self.reserves[owner.index()]
    }

    /// Whether every pool is empty.
    pub fn is_empty(&self) -> bool {
        self.hostages.iter().all(Vec::is_empty) && self.reserves.iter().all(Vec::is_empty)
    }

    /// Records a capture: `capturing` now holds `captured` as a hostage.
    ///
    /// Returns the index of the new hostage entry. The entry's colour is
    /// always the opponent of the capturer.
    #[instrument(skip(self))]
    pub fn on_capture(&mut self, capturing: Color, captured: PieceKind) -> usize {
        let pool = &mut self.hostages[capturing.index()];
        pool.push(Piece::new(captured, capturing.opposite()));
        debug!(holder = %capturing, kind = %captured, size = pool.len(), "Hostage taken");
        pool.len() - 1
    }

    /// Checks an exchange without changing the pools.
    ///
    /// `offered_index` selects an enemy piece `color` holds; `target_index`
    /// selects one of `color`'s own pieces held by the opponent.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::NoSuchHostage`] for a bad index,
    /// [`ExchangeError::InsufficientValue`] when the offer is worth less.
    #[instrument(skip(self))]
    pub fn validate_exchange(
        &self,
        color: Color,
        offered_index: usize,
        target_index: usize,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let opponent = color.opposite();
        let offered = *self
            .hostages(color)
            .get(offered_index)
            .ok_or(ExchangeError::NoSuchHostage {
                holder: color,
                index: offered_index,
            })?;
        let target = *self
            .hostages(opponent)
            .get(target_index)
            .ok_or(ExchangeError::NoSuchHostage {
                holder: opponent,
                index: target_index,
            })?;

        if offered.kind.value() < target.kind.value() {
            warn!(%offered, %target, "Exchange offer too small");
            return Err(ExchangeError::InsufficientValue { offered, target });
        }

        Ok(ExchangeOutcome {
            surrendered: offered,
            released: target,
        })
    }

    /// Validates and performs a two-sided exchange.
    ///
    /// Both hostages leave their pools; the released piece joins `color`'s
    /// reserve and the surrendered one joins the opponent's reserve.
    ///
    /// # Errors
    ///
    /// As [`Ledger::validate_exchange`]; the pools are untouched on error.
    #[instrument(skip(self))]
    pub fn exchange(
        &mut self,
        color: Color,
        offered_index: usize,
        target_index: usize,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let outcome = self.validate_exchange(color, offered_index, target_index)?;
        let opponent = color.opposite();

        self.hostages[color.index()].remove(offered_index);
        self.hostages[opponent.index()].remove(target_index);
        self.reserves[color.index()].push(outcome.released.kind);
        self.reserves[opponent.index()].push(outcome.surrendered.kind);

        debug!(
            %color,
            surrendered = %outcome.surrendered,
            released = %outcome.released,
            "Exchange completed"
        );
        Ok(outcome)
    }

    /// Checks a drop against the reserve and the board.
    ///
    /// # Errors
    ///
    /// [`DropError::EmptyReserve`] if the reserve lacks the kind,
    /// [`DropError::SquareOccupied`] if the square is taken,
    /// [`DropError::IllegalDropSquare`] for a pawn on the first or last rank.
    #[instrument(skip(self, board))]
    pub fn validate_drop(
        &self,
        board: &Board,
        color: Color,
        kind: PieceKind,
        square: Square,
    ) -> Result<(), DropError> {
        if !self.reserves(color).contains(&kind) {
            return Err(DropError::EmptyReserve { color, kind });
        }
        if !board.is_empty(square) {
            return Err(DropError::SquareOccupied(square));
        }
        if kind == PieceKind::Pawn
            && (square.rank() == color.back_rank() || square.rank() == color.promotion_rank())
        {
            return Err(DropError::IllegalDropSquare { kind, square });
        }
        Ok(())
    }

    /// Validates a drop, removes the kind from the reserve and places the piece.
    ///
    /// # Errors
    ///
    /// As [`Ledger::validate_drop`]; neither pool nor board changes on error.
    #[instrument(skip(self, board))]
    pub fn drop_piece(
        &mut self,
        board: &mut Board,
        color: Color,
        kind: PieceKind,
        square: Square,
    ) -> Result<Piece, DropError> {
        self.validate_drop(board, color, kind, square)?;
        let reserve = &mut self.reserves[color.index()];
        if let Some(pos) = reserve.iter().position(|k| *k == kind) {
            reserve.remove(pos);
        }
        let piece = Piece::new(kind, color);
        board.set(square, Some(piece));
        debug!(%color, %kind, %square, "Piece dropped");
        Ok(piece)
    }

    /// Number of pieces of colour `color` held anywhere in the pools.
    pub fn pieces_of(&self, color: Color) -> usize {
        self.hostages(color.opposite()).len() + self.reserves(color).len()
    }
}
