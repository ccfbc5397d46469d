//! Turn controller for Hostage Chess.
//!
//! [`Game`] owns the canonical [`GameState`] and is its only mutator. Every
//! action runs against a copy of the state and is committed only when all
//! checks pass, so a rejected action is never partially observed.

use crate::action::{Action, ActionError, ActionKind};
use crate::codec::repetition_key;
use crate::contracts::{ActionContract, Contract};
use crate::ledger::ExchangeOutcome;
use crate::rules::attacks::king_attacked;
use crate::rules::{
    all_legal_moves, apply_move, fifty_move_rule, has_legal_move, insufficient_material,
    is_in_check, legal_moves, threefold_repetition,
};
use crate::rules::movegen::is_promotion;
use crate::state::GameState;
use crate::status::{DrawReason, GameStatus};
use crate::types::{Color, Piece, PieceKind, Square};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Reports
// ─────────────────────────────────────────────────────────────

/// One entry of the game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAction {
    /// Side that played the action.
    pub mover: Color,
    /// The action as applied.
    pub action: Action,
}

/// A capture produced by a move, and where the piece went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReport {
    /// Captured piece.
    pub piece: Piece,
    /// Square it was taken on.
    pub square: Square,
    /// Index of the new entry in the capturer's hostage pool.
    pub hostage_index: usize,
}

/// A piece placed from the reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReport {
    /// Dropped piece.
    pub piece: Piece,
    /// Target square.
    pub square: Square,
}

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    /// Side that acted.
    pub mover: Color,
    /// Kind of action.
    pub kind: ActionKind,
    /// The action as applied.
    pub action: Action,
    /// Capture produced by a move.
    pub capture: Option<CaptureReport>,
    /// Pool deltas of an exchange.
    pub exchange: Option<ExchangeOutcome>,
    /// Placement made by a drop.
    pub drop: Option<DropReport>,
    /// Promotion piece, when a pawn promoted.
    pub promotion: Option<PieceKind>,
    /// Whether a move castled.
    pub castled: bool,
    /// Status after the action.
    pub status: GameStatus,
}

impl ActionReport {
    fn new(mover: Color, action: Action) -> Self {
        Self {
            mover,
            kind: action.kind(),
            action,
            capture: None,
            exchange: None,
            drop: None,
            promotion: None,
            castled: false,
            status: GameStatus::InProgress,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Legality over the full state
// ─────────────────────────────────────────────────────────────

/// Whether dropping `kind` on `square` would leave `color`'s king safe.
fn drop_keeps_king_safe(state: &GameState, color: Color, kind: PieceKind, square: Square) -> bool {
    let mut board = state.position().board().clone();
    board.set(square, Some(Piece::new(kind, color)));
    !king_attacked(&board, color)
}

fn legal_exchanges(state: &GameState) -> impl Iterator<Item = Action> + '_ {
    let color = state.side_to_move();
    let ledger = state.ledger();
    // An exchange leaves the board untouched, so it cannot answer a check.
    let allowed = !is_in_check(state.position(), color);
    let offered: &[Piece] = if allowed { ledger.hostages(color) } else { &[] };
    let targets = ledger.hostages(color.opposite());
    offered.iter().enumerate().flat_map(move |(o, offer)| {
        targets
            .iter()
            .enumerate()
            .filter(move |(_, target)| offer.kind.value() >= target.kind.value())
            .map(move |(t, _)| Action::exchange(o, t))
    })
}

fn legal_drops(state: &GameState) -> impl Iterator<Item = Action> + '_ {
    let color = state.side_to_move();
    let mut kinds: Vec<PieceKind> = state.ledger().reserves(color).to_vec();
    kinds.sort();
    kinds.dedup();
    kinds.into_iter().flat_map(move |kind| {
        Square::all().filter_map(move |square| {
            let valid = state
                .ledger()
                .validate_drop(state.position().board(), color, kind, square)
                .is_ok();
            (valid && drop_keeps_king_safe(state, color, kind, square))
                .then(|| Action::drop(kind, square))
        })
    })
}

fn legal_board_moves(state: &GameState) -> Vec<Action> {
    let position = state.position();
    let mut actions = Vec::new();
    for (from, to) in all_legal_moves(position) {
        if is_promotion(position, from, to) {
            actions.extend(PieceKind::PROMOTIONS.iter().map(|kind| Action::Move {
                from,
                to,
                promotion: Some(*kind),
            }));
        } else {
            actions.push(Action::board_move(from, to));
        }
    }
    actions
}

/// Every legal action of the side to move, ignoring game status.
fn all_legal_actions(state: &GameState) -> Vec<Action> {
    let mut actions = legal_board_moves(state);
    actions.extend(legal_exchanges(state));
    actions.extend(legal_drops(state));
    actions
}

fn has_legal_action(state: &GameState) -> bool {
    has_legal_move(state.position())
        || legal_exchanges(state).next().is_some()
        || legal_drops(state).next().is_some()
}

/// Neither side can mate now or ever refill its reserve.
fn material_exhausted(state: &GameState) -> bool {
    let ledger = state.ledger();
    let board = state.position().board();
    let reserves_empty = Color::iter().all(|c| ledger.reserves(c).is_empty());
    // A side can come to hold hostages while the opponent has a piece left to take.
    let may_hold_hostages = |c: Color| {
        !ledger.hostages(c).is_empty()
            || board
                .pieces_of(c.opposite())
                .any(|(_, p)| p.kind != PieceKind::King)
    };
    let exchange_possible = Color::iter().all(may_hold_hostages);
    insufficient_material(board) && reserves_empty && !exchange_possible
}

/// Derives the status of `state` given the repetition history ending in it.
#[instrument(skip_all)]
pub fn derive_status(state: &GameState, repetition_keys: &[String]) -> GameStatus {
    let side = state.side_to_move();
    let in_check = is_in_check(state.position(), side);

    let status = if !has_legal_action(state) {
        if in_check {
            GameStatus::Checkmate {
                winner: side.opposite(),
            }
        } else {
            GameStatus::Stalemate
        }
    } else if material_exhausted(state) {
        GameStatus::Draw {
            reason: DrawReason::InsufficientMaterial,
        }
    } else if fifty_move_rule(state.position()) {
        GameStatus::Draw {
            reason: DrawReason::FiftyMoveRule,
        }
    } else if threefold_repetition(repetition_keys) {
        GameStatus::Draw {
            reason: DrawReason::ThreefoldRepetition,
        }
    } else if in_check {
        GameStatus::Check { color: side }
    } else {
        GameStatus::InProgress
    };
    debug!(%status, "Status derived");
    status
}

// ─────────────────────────────────────────────────────────────
//  Game
// ─────────────────────────────────────────────────────────────

/// A game of Hostage Chess: current state, record and derived status.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Game {
    /// State the game started from.
    pub(crate) initial: GameState,
    /// Current state.
    pub(crate) state: GameState,
    /// Applied actions, oldest first.
    pub(crate) record: Vec<RecordedAction>,
    /// Repetition key of every state reached, starting with the initial one.
    pub(crate) repetition_keys: Vec<String>,
    /// Status of the current state.
    pub(crate) status: GameStatus,
}

impl Game {
    /// New game from the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        let state = GameState::new();
        let keys = vec![repetition_key(&state)];
        let status = derive_status(&state, &keys);
        Self {
            initial: state.clone(),
            state,
            record: Vec::new(),
            repetition_keys: keys,
            status,
        }
    }

    /// New game from an arbitrary state, e.g. one produced by the codec.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvariantViolation`] if the state breaks a game
    /// invariant or the side not on move is in check.
    #[instrument(skip(state))]
    pub fn from_state(state: GameState) -> Result<Self, ActionError> {
        let idle = state.side_to_move().opposite();
        if state.position().board().king_count(idle) == 1 && is_in_check(state.position(), idle) {
            warn!(%idle, "Side not on move is in check");
            return Err(ActionError::InvariantViolation(format!(
                "{} is in check but not on move",
                idle
            )));
        }

        let keys = vec![repetition_key(&state)];
        let status = derive_status(&state, &keys);
        let game = Self {
            initial: state.clone(),
            state,
            record: Vec::new(),
            repetition_keys: keys,
            status,
        };
        ActionContract::check_invariants(&game)?;
        Ok(game)
    }

    /// Rebuilds a game by applying `actions` to `initial` in order.
    ///
    /// # Errors
    ///
    /// The first error raised by [`Game::from_state`] or [`Game::apply`].
    #[instrument(skip(initial, actions), fields(count = actions.len()))]
    pub fn replay(initial: GameState, actions: &[Action]) -> Result<Self, ActionError> {
        let mut game = Self::from_state(initial)?;
        for action in actions {
            game.apply(*action)?;
        }
        Ok(game)
    }

    /// Side whose action is next.
    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move()
    }

    /// Whether the game has ended.
    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies an action for the side to move.
    ///
    /// # Errors
    ///
    /// See [`Game::apply_as`].
    pub fn apply(&mut self, action: Action) -> Result<ActionReport, ActionError> {
        self.apply_as(self.side_to_move(), action)
    }

    /// Applies an action submitted on behalf of `color`.
    ///
    /// On error the game is unchanged.
    ///
    /// # Errors
    ///
    /// [`ActionError::GameAlreadyOver`] after a terminal status,
    /// [`ActionError::WrongTurn`] if `color` is not on move, the wrapped
    /// move/exchange/drop error if the board core or the ledger refuses the
    /// action, and [`ActionError::LeavesKingInCheck`] if the actor's king
    /// would be attacked afterwards.
    #[instrument(skip(self), fields(side = %self.side_to_move(), status = %self.status))]
    pub fn apply_as(&mut self, color: Color, action: Action) -> Result<ActionReport, ActionError> {
        let submission = RecordedAction {
            mover: color,
            action,
        };
        let outcome = ActionContract::pre(self, &submission)
            .and_then(|()| self.transition(color, action));
        let (next_state, mut report) = match outcome {
            Ok(ok) => ok,
            Err(error) => {
                warn!(%color, %action, %error, "Action rejected");
                return Err(error);
            }
        };

        #[cfg(debug_assertions)]
        let before = self.clone();

        self.repetition_keys.push(repetition_key(&next_state));
        self.state = next_state;
        self.record.push(submission);
        self.status = derive_status(&self.state, &self.repetition_keys);
        report.status = self.status;

        #[cfg(debug_assertions)]
        if let Err(error) = ActionContract::post(&before, self) {
            warn!(%color, %action, %error, "Postcondition failed, rolling back");
            *self = before;
            return Err(error);
        }

        info!(%color, %action, status = %self.status, "Action applied");
        Ok(report)
    }

    /// Computes the next state and report without touching `self`.
    fn transition(
        &self,
        color: Color,
        action: Action,
    ) -> Result<(GameState, ActionReport), ActionError> {
        let mut next = self.state.clone();
        let mut report = ActionReport::new(color, action);

        match action {
            Action::Move {
                from,
                to,
                promotion,
            } => {
                let outcome = apply_move(self.state.position(), from, to, promotion)?;
                next.set_position(outcome.position);
                if let Some(capture) = outcome.capture {
                    if capture.piece.kind == PieceKind::King {
                        return Err(ActionError::InvariantViolation(format!(
                            "king captured on {}",
                            capture.square
                        )));
                    }
                    let (_, ledger) = next.parts_mut();
                    let hostage_index = ledger.on_capture(color, capture.piece.kind);
                    report.capture = Some(CaptureReport {
                        piece: capture.piece,
                        square: capture.square,
                        hostage_index,
                    });
                }
                report.promotion = outcome.promotion;
                report.castled = outcome.castled;
            }
            Action::Exchange {
                offered_index,
                target_index,
            } => {
                let (position, ledger) = next.parts_mut();
                let outcome = ledger.exchange(color, offered_index, target_index)?;
                if king_attacked(position.board(), color) {
                    return Err(ActionError::LeavesKingInCheck);
                }
                position.set_en_passant(None);
                position.finish_ply(true);
                report.exchange = Some(outcome);
            }
            Action::Drop { piece, square } => {
                let (position, ledger) = next.parts_mut();
                let placed = ledger.drop_piece(position.board_mut(), color, piece, square)?;
                if king_attacked(position.board(), color) {
                    return Err(ActionError::LeavesKingInCheck);
                }
                position.set_en_passant(None);
                position.finish_ply(true);
                report.drop = Some(DropReport {
                    piece: placed,
                    square,
                });
            }
        }

        Ok((next, report))
    }

    /// Every action the side to move may legally play. Empty once the game is over.
    #[instrument(skip(self))]
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_over() {
            return Vec::new();
        }
        all_legal_actions(&self.state)
    }

    /// Legal destinations for the piece on `square`. Empty once the game is over.
    pub fn legal_moves(&self, square: Square) -> Vec<Square> {
        if self.is_over() {
            return Vec::new();
        }
        legal_moves(self.state.position(), square).collect()
    }

    /// Restores the standard starting position with empty pools.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("Game reset");
    }

    /// Takes back the last action by replaying the record without it.
    ///
    /// Returns the removed entry, or `None` when nothing has been played.
    ///
    /// # Errors
    ///
    /// Only if replaying a previously accepted prefix fails, which means the
    /// record is corrupt.
    #[instrument(skip(self), fields(len = self.record.len()))]
    pub fn undo(&mut self) -> Result<Option<RecordedAction>, ActionError> {
        let Some((last, rest)) = self.record.split_last() else {
            return Ok(None);
        };
        let last = *last;
        let actions: Vec<Action> = rest.iter().map(|r| r.action).collect();
        *self = Self::replay(self.initial.clone(), &actions)?;
        debug!(action = %last.action, "Action taken back");
        Ok(Some(last))
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn play(game: &mut Game, notation: &str) -> ActionReport {
        let action: Action = notation.parse().unwrap();
        game.apply(action).unwrap()
    }

    #[test]
    fn test_new_game_has_twenty_actions() {
        let game = Game::new();
        assert_eq!(game.legal_actions().len(), 20);
        assert_eq!(*game.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_wrong_turn_rejected() {
        let mut game = Game::new();
        let before = game.clone();
        let result = game.apply_as(Color::Black, "e7e5".parse().unwrap());
        assert_eq!(
            result,
            Err(ActionError::WrongTurn {
                expected: Color::White,
                submitted: Color::Black
            })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_capture_reports_hostage_index() {
        let mut game = Game::new();
        play(&mut game, "e2e4");
        play(&mut game, "d7d5");
        let report = play(&mut game, "e4d5");
        let capture = report.capture.unwrap();
        assert_eq!(capture.piece, Piece::new(PieceKind::Pawn, Color::Black));
        assert_eq!(capture.square, sq("d5"));
        assert_eq!(capture.hostage_index, 0);
    }

    #[test]
    fn test_drop_flips_turn_and_resets_clock() {
        let state = decode("4k3/8/8/8/8/8/8/4K3 w - - 7 10 -/- N/-").unwrap();
        let mut game = Game::from_state(state).unwrap();
        let report = play(&mut game, "N@d4");
        assert_eq!(
            report.drop,
            Some(DropReport {
                piece: Piece::new(PieceKind::Knight, Color::White),
                square: sq("d4")
            })
        );
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(*game.state().position().halfmove_clock(), 0);
        assert!(game.state().ledger().reserves(Color::White).is_empty());
    }

    #[test]
    fn test_exchange_rejected_in_check() {
        // White king on e1 checked by the rook on e8; white holds a queen hostage.
        let state = decode("k3r3/8/8/8/8/8/8/4K3 w - - 0 1 q/N -/-").unwrap();
        let mut game = Game::from_state(state).unwrap();
        assert_eq!(*game.status(), GameStatus::Check { color: Color::White });
        assert_eq!(
            game.apply(Action::exchange(0, 0)),
            Err(ActionError::LeavesKingInCheck)
        );
        assert!(!game.legal_actions().contains(&Action::exchange(0, 0)));
    }

    #[test]
    fn test_drop_can_block_check() {
        let state = decode("k3r3/8/8/8/8/8/8/4K3 w - - 0 1 -/- R/-").unwrap();
        let mut game = Game::from_state(state).unwrap();
        assert!(game.apply(Action::drop(PieceKind::Rook, sq("a2"))).is_err());
        let report = game.apply(Action::drop(PieceKind::Rook, sq("e4"))).unwrap();
        assert_eq!(report.status, GameStatus::InProgress);
    }

    #[test]
    fn test_drop_rescues_board_checkmate() {
        // Back-rank mate on the board, but white can interpose a reserve rook.
        let state = decode("k7/8/8/8/8/8/5PPP/r5K1 w - - 0 1 -/- R/-").unwrap();
        let game = Game::from_state(state).unwrap();
        assert_eq!(*game.status(), GameStatus::Check { color: Color::White });
        assert!(game
            .legal_actions()
            .iter()
            .all(|a| a.kind() == ActionKind::Drop));
    }

    #[test]
    fn test_promotion_variants_listed() {
        let state = decode("k7/4P3/8/8/8/8/8/4K3 w - - 0 1 -/- -/-").unwrap();
        let game = Game::from_state(state).unwrap();
        let promotions = game
            .legal_actions()
            .into_iter()
            .filter(|a| matches!(a, Action::Move { promotion: Some(_), .. }))
            .count();
        assert_eq!(promotions, 4);
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut game = Game::new();
        play(&mut game, "e2e4");
        let after_one = game.clone();
        play(&mut game, "e7e5");
        let undone = game.undo().unwrap().unwrap();
        assert_eq!(undone.mover, Color::Black);
        assert_eq!(game, after_one);
        game.undo().unwrap();
        assert_eq!(game, Game::new());
        assert_eq!(game.undo(), Ok(None));
    }

    #[test]
    fn test_threefold_repetition_draw() {
        let mut game = Game::new();
        for _ in 0..2 {
            for notation in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                play(&mut game, notation);
            }
        }
        assert_eq!(
            *game.status(),
            GameStatus::Draw {
                reason: DrawReason::ThreefoldRepetition
            }
        );
        assert!(game.legal_actions().is_empty());
    }

    #[test]
    fn test_fifty_move_draw() {
        let state = decode("k7/8/8/8/8/8/8/1R2K3 w - - 99 80 -/- -/-").unwrap();
        let mut game = Game::from_state(state).unwrap();
        play(&mut game, "b1b2");
        assert_eq!(
            *game.status(),
            GameStatus::Draw {
                reason: DrawReason::FiftyMoveRule
            }
        );
    }

    #[test]
    fn test_insufficient_material_respects_pools() {
        let bare = decode("k7/8/8/8/8/8/8/4K3 w - - 0 1 -/- -/-").unwrap();
        assert_eq!(
            *Game::from_state(bare).unwrap().status(),
            GameStatus::Draw {
                reason: DrawReason::InsufficientMaterial
            }
        );
        let reserve = decode("k7/8/8/8/8/8/8/4K3 w - - 0 1 -/- Q/-").unwrap();
        assert_eq!(*Game::from_state(reserve).unwrap().status(), GameStatus::InProgress);
        let both_hold = decode("k7/8/8/8/8/8/8/4K3 w - - 0 1 p/P -/-").unwrap();
        assert_eq!(*Game::from_state(both_hold).unwrap().status(), GameStatus::InProgress);
    }

    #[test]
    fn test_one_sided_hostages_with_capturable_piece_stay_live() {
        let state = decode("8/8/8/8/8/8/3N4/3k2K1 b - - 0 1 q/- -/-").unwrap();
        let mut game = Game::from_state(state).unwrap();
        assert_eq!(*game.status(), GameStatus::InProgress);
        assert!(game.legal_actions().contains(&"d1d2".parse().unwrap()));

        play(&mut game, "d1d2");
        assert_eq!(*game.status(), GameStatus::InProgress);
        let exchange = play(&mut game, "x0:0");
        assert_eq!(exchange.kind, ActionKind::Exchange);
        assert_eq!(game.state().ledger().reserves(Color::White), &[PieceKind::Knight]);
        assert_eq!(game.state().ledger().reserves(Color::Black), &[PieceKind::Queen]);
    }

    #[test]
    fn test_one_sided_hostages_without_prey_are_dead() {
        let state = decode("k7/8/8/8/8/8/8/2n1K3 w - - 0 1 q/- -/-").unwrap();
        assert_eq!(
            *Game::from_state(state).unwrap().status(),
            GameStatus::Draw {
                reason: DrawReason::InsufficientMaterial
            }
        );
    }

    #[test]
    fn test_from_state_rejects_idle_side_in_check() {
        let state = decode("k3R3/8/8/8/8/8/8/4K3 w - - 0 1 -/- -/-").unwrap();
        assert!(matches!(
            Game::from_state(state),
            Err(ActionError::InvariantViolation(_))
        ));
    }
}
