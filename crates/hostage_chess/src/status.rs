//! Game status, derived after every action.

use crate::types::Color;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Why a game was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    /// Neither side can ever mate.
    #[display("insufficient material")]
    InsufficientMaterial,
    /// One hundred plies without an irreversible action.
    #[display("fifty-move rule")]
    FiftyMoveRule,
    /// The same position occurred three times.
    #[display("threefold repetition")]
    ThreefoldRepetition,
}

/// Current status of the game.
///
/// `Check` is informational; only `Checkmate`, `Stalemate` and `Draw` end the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    /// Play continues normally.
    #[display("in progress")]
    InProgress,
    /// The given side is in check and must respond.
    #[display("{} is in check", color)]
    Check {
        /// Side in check.
        color: Color,
    },
    /// The game ended by checkmate.
    #[display("checkmate, {} wins", winner)]
    Checkmate {
        /// Side that delivered mate.
        winner: Color,
    },
    /// The side to move has no legal action and is not in check.
    #[display("stalemate")]
    Stalemate,
    /// The game was drawn.
    #[display("draw by {}", reason)]
    Draw {
        /// Draw rule that applied.
        reason: DrawReason,
    },
}

impl GameStatus {
    /// Whether no further actions are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate { .. } | GameStatus::Stalemate | GameStatus::Draw { .. }
        )
    }

    /// The winner, if the game ended decisively.
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameStatus::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}
