//! First-class invariants for Hostage Chess.
//!
//! Invariants are logical properties that must hold throughout a game.
//! They are testable independently and serve as documentation of what the
//! turn controller guarantees.

use derive_more::Display;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// A named invariant that failed on some state.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{description}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Invariants checked together, reporting every failure rather than the first.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn record_failure<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        record_failure::<S, I1>(state, &mut violations);
        record_failure::<S, I2>(state, &mut violations);
        record_failure::<S, I3>(state, &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub mod history_consistent;
pub mod kings_on_board;
pub mod pools_well_formed;

pub use history_consistent::HistoryConsistentInvariant;
pub use kings_on_board::KingsOnBoardInvariant;
pub use pools_well_formed::PoolsWellFormedInvariant;

/// All game invariants as a composable set.
pub type HostageChessInvariants = (
    KingsOnBoardInvariant,
    PoolsWellFormedInvariant,
    HistoryConsistentInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::game::Game;
    use crate::types::{Color, Square};

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        assert!(HostageChessInvariants::check_all(&Game::new()).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_captures() {
        let actions: Vec<Action> = ["e2e4", "d7d5", "e4d5", "d8d5"]
            .iter()
            .map(|n| n.parse().unwrap())
            .collect();
        let game = Game::replay(Default::default(), &actions).unwrap();
        assert!(HostageChessInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_collects_every_violation() {
        let mut game = Game::new();
        let (position, _) = game.state.parts_mut();
        position.board_mut().set(sq("e1"), None);
        game.record.push(crate::game::RecordedAction {
            mover: Color::White,
            action: Action::board_move(sq("e2"), sq("e4")),
        });
        let violations = HostageChessInvariants::check_all(&game).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].to_string(),
            KingsOnBoardInvariant::description()
        );
    }
}
