//! First-class action types for Hostage Chess.
//!
//! Actions are domain events, not side effects. They represent a player's
//! intent and are validated by the turn controller before anything changes.

use crate::ledger::{DropError, ExchangeError};
use crate::rules::MoveError;
use crate::status::GameStatus;
use crate::types::{Color, PieceKind, Square};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One ply of play: a move, an exchange or a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    /// Move a piece on the board.
    Move {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
        /// Promotion piece for a pawn reaching the last rank.
        promotion: Option<PieceKind>,
    },
    /// Trade one of the actor's hostages for one of the actor's own pieces held by the opponent.
    Exchange {
        /// Index into the actor's hostage pool.
        offered_index: usize,
        /// Index into the opponent's hostage pool.
        target_index: usize,
    },
    /// Place a reserve piece on an empty square.
    Drop {
        /// Kind taken from the reserve.
        piece: PieceKind,
        /// Empty target square.
        square: Square,
    },
}

/// The three action kinds, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Board move.
    #[display("move")]
    Move,
    /// Hostage exchange.
    #[display("exchange")]
    Exchange,
    /// Reserve drop.
    #[display("drop")]
    Drop,
}

impl Action {
    /// Creates a plain move.
    pub fn board_move(from: Square, to: Square) -> Self {
        Action::Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates an exchange.
    pub fn exchange(offered_index: usize, target_index: usize) -> Self {
        Action::Exchange {
            offered_index,
            target_index,
        }
    }

    /// Creates a drop.
    pub fn drop(piece: PieceKind, square: Square) -> Self {
        Action::Drop { piece, square }
    }

    /// Kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Exchange { .. } => ActionKind::Exchange,
            Action::Drop { .. } => ActionKind::Drop,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Move {
                from,
                to,
                promotion,
            } => {
                write!(f, "{}{}", from, to)?;
                if let Some(kind) = promotion {
                    write!(f, "{}", kind.to_char())?;
                }
                Ok(())
            }
            Action::Exchange {
                offered_index,
                target_index,
            } => write!(f, "x{}:{}", offered_index, target_index),
            Action::Drop { piece, square } => {
                write!(f, "{}@{}", piece.to_char().to_ascii_uppercase(), square)
            }
        }
    }
}

/// Error parsing action notation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid action notation {:?}: {}", input, reason)]
pub struct NotationError {
    /// The rejected text.
    pub input: String,
    /// What was wrong with it.
    pub reason: String,
}

impl NotationError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for Action {
    type Err = NotationError;

    /// Parses `e2e4`, `e7e8q`, `N@f3` or `x0:1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        if let Some(rest) = text.strip_prefix('x') {
            let (offered, target) = rest
                .split_once(':')
                .ok_or_else(|| NotationError::new(s, "exchange needs x<offered>:<target>"))?;
            let offered_index = offered
                .parse()
                .map_err(|_| NotationError::new(s, "offered index is not a number"))?;
            let target_index = target
                .parse()
                .map_err(|_| NotationError::new(s, "target index is not a number"))?;
            return Ok(Action::exchange(offered_index, target_index));
        }

        if let Some((piece, square)) = text.split_once('@') {
            let mut chars = piece.chars();
            let kind = match (chars.next(), chars.next()) {
                (Some(c), None) => PieceKind::from_char(c),
                _ => None,
            }
            .ok_or_else(|| NotationError::new(s, "drop needs a single piece letter"))?;
            let square = square
                .parse()
                .map_err(|e: crate::types::SquareParseError| NotationError::new(s, e.to_string()))?;
            return Ok(Action::drop(kind, square));
        }

        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(NotationError::new(s, "move needs <from><to>[promotion]"));
        }
        let parse_sq = |part: &str| {
            part.parse::<Square>()
                .map_err(|e| NotationError::new(s, e.to_string()))
        };
        let from = parse_sq(&text[0..2])?;
        let to = parse_sq(&text[2..4])?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(
                PieceKind::from_char(c)
                    .ok_or_else(|| NotationError::new(s, "unknown promotion piece"))?,
            ),
            None => None,
        };
        Ok(Action::Move {
            from,
            to,
            promotion,
        })
    }
}

/// Error returned by the turn controller. The game state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From, Serialize, Deserialize)]
pub enum ActionError {
    /// The action was submitted for the side not on move.
    #[display("It is {}'s turn, not {}'s", expected, submitted)]
    #[from(skip)]
    WrongTurn {
        /// Side on move.
        expected: Color,
        /// Side the action was submitted for.
        submitted: Color,
    },

    /// The board core refused the move.
    #[display("Illegal move: {}", _0)]
    IllegalMove(MoveError),

    /// The ledger refused the exchange.
    #[display("Illegal exchange: {}", _0)]
    IllegalExchange(ExchangeError),

    /// The ledger refused the drop.
    #[display("Illegal drop: {}", _0)]
    IllegalDrop(DropError),

    /// The action would leave the actor's king attacked.
    #[display("Action leaves the king in check")]
    #[from(skip)]
    LeavesKingInCheck,

    /// The game has ended; no further actions are accepted.
    #[display("Game is already over: {}", _0)]
    #[from(skip)]
    GameAlreadyOver(#[error(not(source))] GameStatus),

    /// A postcondition failed (internal consistency check).
    #[display("Invariant violation: {}", _0)]
    #[from(skip)]
    InvariantViolation(#[error(not(source))] String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    #[test]
    fn test_parse_move() {
        assert_eq!("e2e4".parse(), Ok(Action::board_move(sq("e2"), sq("e4"))));
    }

    #[test]
    fn test_parse_promotion() {
        assert_eq!(
            "e7e8n".parse(),
            Ok(Action::Move {
                from: sq("e7"),
                to: sq("e8"),
                promotion: Some(PieceKind::Knight)
            })
        );
    }

    #[test]
    fn test_parse_drop_and_exchange() {
        assert_eq!("N@f3".parse(), Ok(Action::drop(PieceKind::Knight, sq("f3"))));
        assert_eq!("x2:0".parse(), Ok(Action::exchange(2, 0)));
    }

    #[test]
    fn test_display_matches_notation() {
        for text in ["e2e4", "a7a8q", "Q@d4", "x0:1"] {
            let action: Action = text.parse().unwrap();
            assert_eq!(action.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "e2", "e2e9", "Z@e4", "x1", "xa:b", "e7e8z", "é2e4"] {
            assert!(text.parse::<Action>().is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(Action::exchange(0, 0).kind(), ActionKind::Exchange);
        assert_eq!(Action::drop(PieceKind::Pawn, sq("e4")).kind(), ActionKind::Drop);
    }
}
