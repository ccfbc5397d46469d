//! Contract-based validation for the turn controller.
//!
//! Contracts define correctness through preconditions and postconditions:
//! {P} action {Q}. Preconditions run on every action; postconditions run
//! in debug builds only.

use crate::action::ActionError;
use crate::game::{Game, RecordedAction};
use crate::invariants::{HostageChessInvariants, InvariantSet};
use crate::types::Color;
use strum::IntoEnumIterator;
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), ActionError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), ActionError>;
}

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game has not ended.
pub struct GameNotOver;

impl GameNotOver {
    /// Fails with [`ActionError::GameAlreadyOver`] after a terminal status.
    #[instrument(skip(game))]
    pub fn check(game: &Game) -> Result<(), ActionError> {
        if game.is_over() {
            Err(ActionError::GameAlreadyOver(*game.status()))
        } else {
            Ok(())
        }
    }
}

/// Precondition: the action is submitted for the side on move.
pub struct PlayersTurn;

impl PlayersTurn {
    /// Fails with [`ActionError::WrongTurn`] otherwise.
    #[instrument(skip(game))]
    pub fn check(submission: &RecordedAction, game: &Game) -> Result<(), ActionError> {
        let expected = game.side_to_move();
        if submission.mover != expected {
            Err(ActionError::WrongTurn {
                expected,
                submitted: submission.mover,
            })
        } else {
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Postconditions
// ─────────────────────────────────────────────────────────────

/// Postcondition: the turn passed to the other side.
pub struct TurnAlternated;

impl TurnAlternated {
    /// Whether `after` has the opposite side on move.
    pub fn holds(before: &Game, after: &Game) -> bool {
        after.side_to_move() == before.side_to_move().opposite()
    }
}

/// Postcondition: no piece was created or destroyed.
///
/// Every piece of a colour is on the board, in the opponent's hostage pool
/// or in its own reserve. Promotion changes a kind, never the count.
pub struct MaterialConserved;

impl MaterialConserved {
    /// Whether per-colour piece counts match across the transition.
    pub fn holds(before: &Game, after: &Game) -> bool {
        Color::iter().all(|color| {
            let count = |game: &Game| {
                game.state().position().board().pieces_of(color).count()
                    + game.state().ledger().pieces_of(color)
            };
            let (was, now) = (count(before), count(after));
            if was != now {
                warn!(%color, was, now, "Material not conserved");
            }
            was == now
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  Action Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for every action kind.
///
/// Preconditions:
/// - Game not over
/// - Submitted for the side on move
///
/// Postconditions:
/// - Game invariants hold
/// - Turn alternated
/// - Material conserved
pub struct ActionContract;

impl ActionContract {
    /// Runs the invariant set against `game`.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvariantViolation`] listing every failed invariant.
    pub fn check_invariants(game: &Game) -> Result<(), ActionError> {
        HostageChessInvariants::check_all(game).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            ActionError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })
    }
}

impl Contract<Game, RecordedAction> for ActionContract {
    fn pre(game: &Game, action: &RecordedAction) -> Result<(), ActionError> {
        GameNotOver::check(game)?;
        PlayersTurn::check(action, game)?;
        Ok(())
    }

    fn post(before: &Game, after: &Game) -> Result<(), ActionError> {
        Self::check_invariants(after)?;
        if !TurnAlternated::holds(before, after) {
            return Err(ActionError::InvariantViolation(
                "Postcondition failed: side to move did not change".to_string(),
            ));
        }
        if !MaterialConserved::holds(before, after) {
            return Err(ActionError::InvariantViolation(
                "Postcondition failed: material not conserved".to_string(),
            ));
        }
        Ok(())
    }
}
